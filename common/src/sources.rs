//! Source registry: categories of named feeds, each with a declared type.

use serde::{Deserialize, Serialize};

/// Declared kind of a feed source. Drives how many entries are taken per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Arxiv,
    Blog,
    News,
    #[default]
    #[serde(other)]
    Unknown,
}

impl SourceType {
    /// Entries taken from one fetch of a source of this type.
    /// arXiv listings are a supplementary signal and are capped lower.
    pub fn quota(self) -> usize {
        match self {
            SourceType::Arxiv => 2,
            SourceType::Blog => 4,
            SourceType::News | SourceType::Unknown => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::Arxiv => "arxiv",
            SourceType::Blog => "blog",
            SourceType::News => "news",
            SourceType::Unknown => "unknown",
        }
    }

    /// Human-readable label for reports; `None` for untyped sources.
    pub fn label(self) -> Option<&'static str> {
        match self {
            SourceType::Arxiv => Some("arXiv"),
            SourceType::Blog => Some("Blog"),
            SourceType::News => Some("News"),
            SourceType::Unknown => None,
        }
    }
}

/// A single named feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    #[serde(rename = "type", default)]
    pub source_type: SourceType,
}

impl SourceConfig {
    pub fn new(name: &str, url: &str, source_type: SourceType) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            source_type,
        }
    }

    /// Declared type, except that untyped sources named like an arXiv
    /// listing are treated as arXiv.
    pub fn effective_type(&self) -> SourceType {
        match self.source_type {
            SourceType::Unknown if self.name.to_lowercase().contains("arxiv") => SourceType::Arxiv,
            declared => declared,
        }
    }
}

/// Ordered list of sources under one topical heading
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub category: String,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

/// Built-in registry used when the configuration does not list categories.
pub fn default_categories() -> Vec<CategoryConfig> {
    use SourceType::*;

    vec![
        CategoryConfig {
            category: "AI / LLM".to_string(),
            sources: vec![
                SourceConfig::new("arXiv cs.AI", "https://export.arxiv.org/rss/cs.AI", Arxiv),
                SourceConfig::new("arXiv cs.LG", "https://export.arxiv.org/rss/cs.LG", Arxiv),
                SourceConfig::new("OpenAI Blog", "https://openai.com/blog/rss.xml", Blog),
                SourceConfig::new("DeepMind", "https://deepmind.google/rss.xml", Blog),
                SourceConfig::new("Google Research", "https://research.google/blog/rss", Blog),
            ],
        },
        CategoryConfig {
            category: "Computer Science / Software Engineering".to_string(),
            sources: vec![
                SourceConfig::new("arXiv cs.SE", "https://export.arxiv.org/rss/cs.SE", Arxiv),
                SourceConfig::new("arXiv cs.DC", "https://export.arxiv.org/rss/cs.DC", Arxiv),
                SourceConfig::new("GitHub Blog", "https://github.blog/rss", Blog),
                SourceConfig::new("Rust Blog", "https://blog.rust-lang.org/feed.xml", Blog),
                SourceConfig::new("Hacker News", "https://hnrss.org/frontpage", News),
            ],
        },
        CategoryConfig {
            category: "Engineering / Systems / Tools".to_string(),
            sources: vec![
                SourceConfig::new("GitHub Blog", "https://github.blog/rss", Blog),
                SourceConfig::new("Hacker News", "https://hnrss.org/frontpage", News),
            ],
        },
    ]
}
