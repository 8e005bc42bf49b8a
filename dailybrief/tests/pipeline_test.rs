use anyhow::Result;
use chrono::{DateTime, Utc};
use common::{CategoryConfig, Config, SourceConfig, SourceType};
use dailybrief::collector::Collector;
use dailybrief::ingestion::{FeedEntry, FeedFetcher, FetchedFeed};
use dailybrief::llm::summarizer::Summarizer;
use dailybrief::llm::{LlmProvider, LlmRequest, LlmResponse, UsageMetadata};
use dailybrief::run::Pipeline;
use std::sync::Arc;

struct OneFeed;

#[async_trait::async_trait]
impl FeedFetcher for OneFeed {
    async fn fetch(&self, url: &str) -> Option<FetchedFeed> {
        if !url.contains("good") {
            return None;
        }
        Some(FetchedFeed {
            title: Some("Good".to_string()),
            entries: (1..=6)
                .map(|i| FeedEntry {
                    title: Some(format!("Headline {}", i)),
                    link: Some(format!("https://good.example/{}", i)),
                    summary: Some(format!("Body of story {}", i)),
                    ..FeedEntry::default()
                })
                .collect(),
        })
    }
}

struct FixedAnswer;

#[async_trait::async_trait]
impl LlmProvider for FixedAnswer {
    async fn generate(&self, _request: LlmRequest) -> Result<LlmResponse> {
        Ok(LlmResponse {
            content: "Compilers had a big day.".to_string(),
            usage: UsageMetadata::default(),
            model: "fixed".to_string(),
        })
    }
}

fn config(dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.output.dir = dir.to_string_lossy().to_string();
    config.categories = vec![
        CategoryConfig {
            category: "Systems".to_string(),
            sources: vec![SourceConfig::new("Good News", "https://good.example/rss", SourceType::News)],
        },
        CategoryConfig {
            category: "Unreachable".to_string(),
            sources: vec![SourceConfig::new("Bad", "https://bad.example/rss", SourceType::Blog)],
        },
    ];
    config
}

fn evening() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-01T13:00:00Z").unwrap().with_timezone(&Utc)
}

#[tokio::test]
async fn run_writes_slotted_report_with_summary() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config(tmp.path());
    let pipeline = Pipeline::new(
        Collector::new(Arc::new(OneFeed)),
        Summarizer::with_provider(Arc::new(FixedAnswer)),
        &config,
    );

    let outcome = pipeline.run(evening()).await.unwrap();

    assert_eq!(outcome.path, tmp.path().join("2024-05-01-evening.md"));
    assert_eq!(outcome.categories, 2);
    assert_eq!(outcome.items, 3);
    assert!(outcome.summarized);

    let md = std::fs::read_to_string(&outcome.path).unwrap();
    assert!(md.contains("Date: 2024-05-01 Evening"));
    assert!(md.contains("Compilers had a big day."));
    assert!(md.contains("## 🔥 Systems"));
    assert!(md.contains("Headline 3"));
    assert!(!md.contains("Headline 4"));
    assert!(!md.contains("Unreachable"));
}

#[tokio::test]
async fn run_without_summary_or_slot() {
    let tmp = tempfile::tempdir().unwrap();
    let mut config = config(tmp.path().join("out").as_path());
    config.features.summary = false;
    config.features.time_slot = false;
    let pipeline = Pipeline::new(
        Collector::new(Arc::new(OneFeed)),
        Summarizer::with_provider(Arc::new(FixedAnswer)),
        &config,
    );

    let outcome = pipeline.run(evening()).await.unwrap();

    assert_eq!(outcome.path, tmp.path().join("out").join("2024-05-01.md"));
    assert!(!outcome.summarized);
    let md = std::fs::read_to_string(&outcome.path).unwrap();
    assert!(!md.contains("Today's Summary"));
}

#[tokio::test]
async fn unwritable_output_fails_the_run() {
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("daily");
    std::fs::write(&blocker, "a file, not a directory").unwrap();
    let config = config(&blocker);
    let pipeline = Pipeline::new(Collector::new(Arc::new(OneFeed)), Summarizer::disabled(), &config);

    assert!(pipeline.run(evening()).await.is_err());
}
