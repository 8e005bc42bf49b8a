use common::SourceType;

/// Where an item's text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    RssSnippet,
    Fulltext,
}

/// One collected feed entry, possibly enriched with the full article text.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    /// Name of the source the entry was fetched from
    pub source: String,
    pub source_type: SourceType,
    /// Text supplied by the feed itself, possibly empty
    pub snippet: String,
    pub full_content: Option<String>,
    pub content_type: ContentType,
}

impl NewsItem {
    /// Whether a non-blank full article text was attached
    pub fn has_full_text(&self) -> bool {
        self.full_content.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    /// Best text available for the item: full text first, then the feed snippet.
    pub fn best_content(&self) -> &str {
        match self.full_content.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => &self.snippet,
        }
    }
}

/// Items collected for one category, in fetch order.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryItems {
    pub category: String,
    pub items: Vec<NewsItem>,
}

/// Everything gathered during one run, in configured category order.
pub type RunResult = Vec<CategoryItems>;

/// Total number of items across all categories
pub fn total_items(result: &[CategoryItems]) -> usize {
    result.iter().map(|block| block.items.len()).sum()
}
