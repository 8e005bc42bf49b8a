/*!
common/src/lib.rs

Shared configuration types for dailybrief.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader merging a default file with an optional override file
- The source registry types (see `sources`)
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod sources;

pub use sources::{default_categories, CategoryConfig, SourceConfig, SourceType};

/// Feed / article fetching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Timeout applied to each feed request
    pub feed_timeout_seconds: u64,
    /// Timeout applied to each full-article request
    pub article_timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            feed_timeout_seconds: 10,
            article_timeout_seconds: 15,
            user_agent: "dailybrief-bot/0.1 (research & tech news digest)".to_string(),
        }
    }
}

/// Toggles for the optional enrichment stages of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Ask the LLM for a summary of the collected items
    pub summary: bool,
    /// Fetch full article text for allow-listed domains
    pub full_text: bool,
    /// Append "morning"/"evening" to the report title and file name
    pub time_slot: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            summary: true,
            full_text: true,
            time_slot: true,
        }
    }
}

/// Domains for which full-text extraction is attempted.
/// A link matches when its host equals an entry or is a subdomain of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FullTextConfig {
    pub allowed_domains: Vec<String>,
}

impl Default for FullTextConfig {
    fn default() -> Self {
        Self {
            allowed_domains: vec![
                "github.blog".to_string(),
                "blog.rust-lang.org".to_string(),
                "openai.com".to_string(),
                "deepmind.google".to_string(),
                "research.google".to_string(),
            ],
        }
    }
}

/// Remote LLM config (OpenAI-compatible chat completions endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub max_retries: u32,
    /// Hard upper bound on the characters of one summary prompt
    pub max_prompt_chars: usize,
    /// Per-item content pre-trim applied before budgeting
    pub max_item_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.siliconflow.cn/v1/chat/completions".to_string(),
            api_key_env: "SILICONFLOW_API_KEY".to_string(),
            model: "deepseek-ai/DeepSeek-V3.2".to_string(),
            timeout_seconds: 600,
            max_tokens: Some(32767),
            temperature: Some(0.5),
            top_p: Some(0.7),
            frequency_penalty: Some(0.5),
            max_retries: 5,
            max_prompt_chars: 30_000,
            max_item_chars: 800,
        }
    }
}

/// Report output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving `YYYY-MM-DD[-slot].md` files
    pub dir: String,
    /// Offset (hours east of UTC) used for human-readable timestamps
    pub display_utc_offset_hours: i32,
    pub title: String,
    pub footer: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: "daily".to_string(),
            display_utc_offset_hours: 8,
            title: "🧠 Research & Tech Daily Brief".to_string(),
            footer: "_Generated automatically · GitHub Actions_".to_string(),
        }
    }
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub full_text: FullTextConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default = "default_categories")]
    pub categories: Vec<CategoryConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            features: FeatureConfig::default(),
            full_text: FullTextConfig::default(),
            llm: LlmConfig::default(),
            output: OutputConfig::default(),
            categories: default_categories(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    /// With neither present the built-in defaults are returned.
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for (path, label) in [(default_path, "default"), (override_path, "override")] {
            let Some(path) = path else { continue };
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {} config: {}", label, path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse {} configuration", label))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }

    /// URLs of the sources that appear in more than one category.
    /// Duplicates are allowed (a feed may feed several categories); this is
    /// only reported at startup.
    pub fn shared_sources(&self) -> Vec<String> {
        let mut seen = std::collections::HashMap::<&str, usize>::new();
        for category in &self.categories {
            for source in &category.sources {
                *seen.entry(source.url.as_str()).or_default() += 1;
            }
        }
        let mut shared: Vec<String> = seen
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(url, _)| url.to_string())
            .collect();
        shared.sort();
        shared
    }
}

// Arrays are replaced wholesale: an override `[[categories]]` list
// replaces the default registry rather than appending to it.
fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}
