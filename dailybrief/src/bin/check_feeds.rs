use common::Config;
use dailybrief::ingestion::{FeedFetcher, HttpFeedFetcher};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let default_path = PathBuf::from("config.default.toml");
    let override_path = PathBuf::from("config.toml");
    let config = Config::load_with_defaults(Some(&default_path), Some(&override_path)).await?;
    let fetcher = HttpFeedFetcher::new(&config.fetch)?;

    let mut failed = 0;
    for block in &config.categories {
        println!("\n{}", "=".repeat(60));
        println!("{}", block.category);
        println!("{}", "=".repeat(60));

        for source in &block.sources {
            match fetcher.fetch(&source.url).await {
                Some(feed) => {
                    println!(
                        "✓ {} [{}]: {} entries, takes {}",
                        source.name,
                        source.effective_type().as_str(),
                        feed.entries.len(),
                        source.effective_type().quota().min(feed.entries.len())
                    );
                    for (i, entry) in feed.entries.iter().take(3).enumerate() {
                        println!("    {}. {}", i + 1, entry.title.as_deref().unwrap_or("Untitled"));
                        println!("       URL: {}", entry.link.as_deref().unwrap_or("none"));
                        println!("       Snippet: {} chars", entry.snippet().chars().count());
                    }
                }
                None => {
                    failed += 1;
                    println!("✗ {}: {}", source.name, source.url);
                }
            }
        }
    }

    println!("\n{} source(s) failed", failed);
    Ok(())
}
