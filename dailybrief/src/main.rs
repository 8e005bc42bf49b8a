/*
dailybrief - main.rs
Collects the configured feeds once, asks the LLM for a summary when a key is
available, writes the Markdown report and exits.
*/

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use common::Config;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use dailybrief::run::Pipeline;

#[derive(Parser, Debug)]
#[command(name = "dailybrief", about = "Research & tech news digest: RSS -> LLM summary -> Markdown")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Directory receiving the report (overrides [output] dir)
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Skip the LLM summary
    #[arg(long)]
    no_summary: bool,

    /// Only use feed-provided text
    #[arg(long)]
    no_full_text: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let mut config = load_config(args.config).await?;
    if let Some(dir) = args.output_dir {
        config.output.dir = dir.to_string_lossy().to_string();
    }
    if args.no_summary {
        config.features.summary = false;
    }
    if args.no_full_text {
        config.features.full_text = false;
    }

    for url in config.shared_sources() {
        info!(%url, "source listed in more than one category");
    }

    let api_key = std::env::var(&config.llm.api_key_env).ok().filter(|k| !k.trim().is_empty());
    if api_key.is_none() && config.features.summary {
        info!(env = %config.llm.api_key_env, "API key not set, the report will have no summary");
    }

    let started = Utc::now();
    let pipeline = Pipeline::from_config(&config, api_key)?;
    let outcome = match pipeline.run(started).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %format!("{:#}", e), "run failed");
            return Err(e);
        }
    };

    info!(
        path = %outcome.path.display(),
        categories = outcome.categories,
        items = outcome.items,
        summarized = outcome.summarized,
        elapsed_secs = (Utc::now() - started).num_seconds(),
        "report complete"
    );

    // Lingering HTTP connections must not keep the process alive
    std::process::exit(0);
}

async fn load_config(explicit: Option<PathBuf>) -> Result<Config> {
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = explicit {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let config = Config::load_with_defaults(
        if default_path.exists() { Some(&default_path) } else { None },
        override_path.as_deref(),
    )
    .await
    .map_err(|e| {
        error!(%e, "failed to load configuration");
        e
    })?;
    info!(default = ?default_path, override = ?override_path, "configuration loaded");

    Ok(config)
}
