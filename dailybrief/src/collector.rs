//! Collection driver: categories → sources → selected entries → news items.

use common::{CategoryConfig, SourceConfig};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::ingestion::{FeedEntry, FeedFetcher};
use crate::model::{CategoryItems, ContentType, NewsItem, RunResult};
use crate::scraping::{can_fetch_full_text, ArticleFetcher};

const PREVIEW_CHARS: usize = 100;

pub struct Collector {
    feeds: Arc<dyn FeedFetcher>,
    articles: Option<Arc<dyn ArticleFetcher>>,
    allowed_domains: Vec<String>,
}

impl Collector {
    /// Collector that only uses feed-provided text.
    pub fn new(feeds: Arc<dyn FeedFetcher>) -> Self {
        Self {
            feeds,
            articles: None,
            allowed_domains: Vec::new(),
        }
    }

    /// Enable full-text enrichment for links on `allowed_domains`.
    pub fn with_full_text(mut self, articles: Arc<dyn ArticleFetcher>, allowed_domains: Vec<String>) -> Self {
        self.articles = Some(articles);
        self.allowed_domains = allowed_domains;
        self
    }

    /// Walk every category and source in declaration order.
    /// Categories and sources are processed one after another; the selected
    /// entries of a single source are enriched concurrently.
    pub async fn collect(&self, categories: &[CategoryConfig]) -> RunResult {
        let mut results = Vec::with_capacity(categories.len());

        for block in categories {
            info!(category = %block.category, "processing category");
            let mut items = Vec::new();

            for source in &block.sources {
                items.extend(self.collect_source(source).await);
            }

            info!(category = %block.category, items = items.len(), "category collected");
            results.push(CategoryItems {
                category: block.category.clone(),
                items,
            });
        }

        results
    }

    /// Items from one source; empty when the feed cannot be fetched.
    pub async fn collect_source(&self, source: &SourceConfig) -> Vec<NewsItem> {
        info!(source = %source.name, url = %source.url, "fetching feed");
        let Some(feed) = self.feeds.fetch(&source.url).await else {
            warn!(source = %source.name, "failed to fetch source, skipping");
            return Vec::new();
        };

        let source_type = source.effective_type();
        let quota = source_type.quota();
        info!(
            source = %source.name,
            title = %feed.title.as_deref().unwrap_or("Unknown"),
            entries = feed.entries.len(),
            selected = quota.min(feed.entries.len()),
            source_type = source_type.as_str(),
            "feed fetched"
        );

        let selected = feed.entries.into_iter().take(quota);
        join_all(selected.map(|entry| self.build_item(source, entry))).await
    }

    async fn build_item(&self, source: &SourceConfig, entry: FeedEntry) -> NewsItem {
        let mut item = NewsItem {
            title: entry
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Untitled".to_string()),
            link: entry
                .link
                .clone()
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| "#".to_string()),
            source: source.name.clone(),
            source_type: source.effective_type(),
            snippet: entry.snippet(),
            full_content: None,
            content_type: ContentType::RssSnippet,
        };

        debug!(title = %item.title, link = %item.link, snippet = %preview(&item.snippet), "entry selected");

        let Some(articles) = &self.articles else {
            return item;
        };
        if !can_fetch_full_text(&item.link, &self.allowed_domains) {
            debug!(link = %item.link, "domain not allow-listed, keeping feed snippet");
            return item;
        }

        match articles.fetch(&item.link).await {
            Some(text) => {
                info!(link = %item.link, chars = text.chars().count(), "full text extracted");
                item.full_content = Some(text);
                item.content_type = ContentType::Fulltext;
            }
            None => {
                warn!(link = %item.link, "full text extraction failed, keeping feed snippet");
            }
        }
        item
    }
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect::<String>().replace('\n', " ")
}
