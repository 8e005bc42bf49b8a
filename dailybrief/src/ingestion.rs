use anyhow::{Context, Result};
use common::FetchConfig;
use feed_rs::model::{Entry, Feed};
use feed_rs::parser;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

/// Parsed feed reduced to what a run needs: a title and ordered entries.
#[derive(Debug, Clone, Default)]
pub struct FetchedFeed {
    pub title: Option<String>,
    pub entries: Vec<FeedEntry>,
}

/// One feed entry with its text fields kept apart, so the caller can pick
/// a snippet in a fixed priority order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    /// Plain text derived from `content` (or `summary` when there is no content)
    pub content_snippet: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
}

impl FeedEntry {
    /// First non-empty of: content snippet, content, summary, description.
    pub fn snippet(&self) -> String {
        [&self.content_snippet, &self.content, &self.summary, &self.description]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .cloned()
            .unwrap_or_default()
    }
}

/// Source of parsed feeds. Implementations never fail past this boundary:
/// a feed that cannot be fetched or parsed is reported as `None`.
#[async_trait::async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<FetchedFeed>;
}

/// Feed fetcher over HTTP with a per-request timeout.
pub struct HttpFeedFetcher {
    client: Client,
    max_attempts: u32,
}

impl HttpFeedFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.feed_timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            client,
            max_attempts: 2,
        })
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}

#[async_trait::async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Option<FetchedFeed> {
        match fetch_and_parse_feed(&self.client, url, self.max_attempts).await {
            Ok(feed) => Some(convert_feed(feed)),
            Err(e) => {
                warn!(%url, error = %format!("{:#}", e), "feed fetch failed");
                None
            }
        }
    }
}

/// Fetches a feed from the given URL and parses it.
/// Server errors, rate limiting and network errors are retried; other
/// client errors are not.
pub async fn fetch_and_parse_feed(client: &Client, url: &str, max_attempts: u32) -> Result<Feed> {
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        if attempt > 1 {
            let backoff = Duration::from_secs(2u64.pow(attempt - 2)); // 1s, 2s, 4s...
            info!("Retrying feed fetch for {} (attempt {}/{}) after {:?}...", url, attempt, max_attempts, backoff);
            tokio::time::sleep(backoff).await;
        }

        match client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    let bytes = response.bytes().await.context("failed to read response body")?;
                    let feed = parser::parse(bytes.as_ref()).context("failed to parse feed")?;
                    return Ok(feed);
                } else if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    last_error = Some(anyhow::anyhow!("feed fetch failed with status: {}", status));
                    continue;
                } else {
                    // 4xx other than 429 will not get better on retry
                    return Err(anyhow::anyhow!("feed fetch failed with status: {}", status));
                }
            }
            Err(e) => {
                last_error = Some(anyhow::Error::new(e).context("network error during fetch"));
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("unknown error after retries")))
}

/// Parse raw feed bytes into a `FetchedFeed`.
pub fn parse_feed_bytes(bytes: &[u8]) -> Result<FetchedFeed> {
    let feed = parser::parse(bytes).context("failed to parse feed")?;
    Ok(convert_feed(feed))
}

fn convert_feed(feed: Feed) -> FetchedFeed {
    FetchedFeed {
        title: feed.title.map(|t| t.content),
        entries: feed.entries.into_iter().map(convert_entry).collect(),
    }
}

fn convert_entry(entry: Entry) -> FeedEntry {
    let content = entry
        .content
        .as_ref()
        .and_then(|c| c.body.clone())
        .filter(|body| !body.trim().is_empty());
    let summary = entry.summary.map(|s| s.content).filter(|s| !s.trim().is_empty());
    let description = entry
        .media
        .iter()
        .find_map(|m| m.description.as_ref().map(|d| d.content.clone()))
        .filter(|d| !d.trim().is_empty());

    let content_snippet = content
        .as_deref()
        .or(summary.as_deref())
        .map(html_to_text)
        .filter(|s| !s.is_empty());

    FeedEntry {
        title: entry.title.map(|t| t.content.trim().to_string()),
        link: entry.links.first().map(|l| l.href.clone()),
        content_snippet,
        content,
        summary,
        description,
    }
}

/// Strip markup from a feed HTML fragment, keeping line structure.
pub fn html_to_text(html: &str) -> String {
    match html2text::from_read(html.as_bytes(), 10_000) {
        Ok(text) => text.trim().to_string(),
        Err(_) => html.trim().to_string(),
    }
}
