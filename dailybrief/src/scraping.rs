use anyhow::{Context, Result};
use common::FetchConfig;
use reqwest::Client;
use std::io::Cursor;
use std::time::Duration;
use tracing::{debug, warn};

/// Full-text source for article pages. Returns `None` when nothing usable
/// could be extracted.
#[async_trait::async_trait]
pub trait ArticleFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Option<String>;
}

/// Whether full-text extraction should be attempted for `url`: its host must
/// equal one of `allowed_domains` or be a subdomain of one.
pub fn can_fetch_full_text(url: &str, allowed_domains: &[String]) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();

    allowed_domains.iter().any(|domain| {
        let domain = domain.trim().trim_start_matches('.').to_ascii_lowercase();
        !domain.is_empty()
            && (host == domain || host.ends_with(&format!(".{}", domain)))
    })
}

/// Article fetcher using readability for main-content detection and
/// html2text for conversion to plain Markdown.
pub struct HttpArticleFetcher {
    client: Client,
}

impl HttpArticleFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.article_timeout_seconds))
            .user_agent(config.user_agent.as_str())
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ArticleFetcher for HttpArticleFetcher {
    async fn fetch(&self, url: &str) -> Option<String> {
        match scrape_article_content(&self.client, url).await {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => {
                debug!(%url, "article extraction produced no text");
                None
            }
            Err(e) => {
                warn!(%url, error = %format!("{:#}", e), "article fetch failed");
                None
            }
        }
    }
}

/// Scrapes the content of an article from the given URL.
/// Returns the extracted text content (empty when readability finds nothing).
pub async fn scrape_article_content(client: &Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await.context("failed to fetch article page")?;

    let status = response.status();
    if !status.is_success() {
        return Err(anyhow::anyhow!("article fetch failed with status: {}", status));
    }

    // Readability requires a Reader, so we fetch bytes
    let bytes = response.bytes().await.context("failed to read response body")?;
    let mut reader = Cursor::new(bytes);

    // Relative links in the page are resolved against this
    let url_obj = url::Url::parse(url).context("failed to parse article URL")?;

    match readability::extractor::extract(&mut reader, &url_obj) {
        Ok(product) => match html2text::from_read(product.content.as_bytes(), 100) {
            Ok(markdown) => {
                debug!("scraping: readability extracted {} chars from {}", markdown.chars().count(), url);
                Ok(markdown)
            }
            Err(e) => {
                warn!("scraping: failed to convert extracted HTML to text: {}", e);
                Ok(product.text)
            }
        },
        Err(e) => {
            warn!("scraping: readability failed for {}: {}", url, e);
            Ok(String::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domains() -> Vec<String> {
        vec!["github.blog".to_string(), "blog.rust-lang.org".to_string()]
    }

    #[test]
    fn exact_and_subdomain_hosts_match() {
        assert!(can_fetch_full_text("https://github.blog/news/some-post/", &domains()));
        assert!(can_fetch_full_text("https://www.github.blog/x", &domains()));
        assert!(can_fetch_full_text("https://blog.rust-lang.org/2024/01/01/post.html", &domains()));
    }

    #[test]
    fn lookalike_and_invalid_urls_do_not_match() {
        assert!(!can_fetch_full_text("https://notgithub.blog/post", &domains()));
        assert!(!can_fetch_full_text("https://github.blog.evil.com/post", &domains()));
        assert!(!can_fetch_full_text("#", &domains()));
        assert!(!can_fetch_full_text("not a url", &domains()));
        assert!(!can_fetch_full_text("https://github.blog/post", &[]));
    }
}
