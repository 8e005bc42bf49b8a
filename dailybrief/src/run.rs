//! One end-to-end run: collect, summarize, render, write.

use anyhow::Result;
use chrono::{DateTime, Utc};
use common::{CategoryConfig, Config, FeatureConfig, OutputConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::collector::Collector;
use crate::ingestion::HttpFeedFetcher;
use crate::llm::summarizer::Summarizer;
use crate::model::total_items;
use crate::output::{display_offset, write_report, TimeSlot};
use crate::report::{Report, ReportContext};
use crate::scraping::HttpArticleFetcher;

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub path: PathBuf,
    pub categories: usize,
    pub items: usize,
    pub summarized: bool,
}

pub struct Pipeline {
    collector: Collector,
    summarizer: Summarizer,
    categories: Vec<CategoryConfig>,
    features: FeatureConfig,
    output: OutputConfig,
}

impl Pipeline {
    pub fn new(collector: Collector, summarizer: Summarizer, config: &Config) -> Self {
        Self {
            collector,
            summarizer,
            categories: config.categories.clone(),
            features: config.features.clone(),
            output: config.output.clone(),
        }
    }

    /// Pipeline over the real HTTP collaborators. Full-text and summary
    /// stages are wired only when their feature toggle is on.
    pub fn from_config(config: &Config, api_key: Option<String>) -> Result<Self> {
        let feeds = Arc::new(HttpFeedFetcher::new(&config.fetch)?);
        let mut collector = Collector::new(feeds);
        if config.features.full_text {
            let articles = Arc::new(HttpArticleFetcher::new(&config.fetch)?);
            collector = collector.with_full_text(articles, config.full_text.allowed_domains.clone());
        } else {
            info!("full-text extraction disabled");
        }

        let summarizer = if config.features.summary {
            Summarizer::from_config(
                &config.llm,
                api_key,
                display_offset(config.output.display_utc_offset_hours),
            )
        } else {
            info!("summary generation disabled");
            Summarizer::disabled()
        };

        Ok(Self::new(collector, summarizer, config))
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunOutcome> {
        let slot = self.features.time_slot.then(|| TimeSlot::from_datetime(now));
        let date = now.date_naive();
        info!(
            date = %date,
            slot = slot.map(|s| s.as_str()).unwrap_or("-"),
            categories = self.categories.len(),
            "starting run"
        );

        let result = self.collector.collect(&self.categories).await;
        let items = total_items(&result);
        info!(categories = result.len(), items, "collection finished");

        let summary = if self.features.summary {
            self.summarizer.summarize(&result, now).await
        } else {
            None
        };
        match &summary {
            Some(text) => info!(chars = text.chars().count(), "summary ready"),
            None if self.features.summary => warn!("no summary, report will list items only"),
            None => {}
        }

        let ctx = ReportContext::new(date, &self.output)
            .with_summary(summary.as_deref())
            .with_generated_at(Some(now))
            .with_slot(slot);
        let report = Report::render(&ctx, &result);
        let path = write_report(&PathBuf::from(&self.output.dir), &report.file_name, &report.markdown).await?;

        Ok(RunOutcome {
            path,
            categories: result.len(),
            items,
            summarized: summary.is_some(),
        })
    }
}
