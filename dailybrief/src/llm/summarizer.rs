// Summarizer module
use chrono::{DateTime, FixedOffset, Offset, Utc};
use common::LlmConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::prompt::{build_prompt, flatten_records, PromptBudget, PromptSkeleton};
use super::remote::RemoteLlmProvider;
use super::{LlmApiError, LlmProvider, LlmRequest};
use crate::model::CategoryItems;

/// Delay before the second attempt; doubled for each following one.
pub const BASE_RETRY_DELAY: Duration = Duration::from_millis(2_000);
pub const MAX_RETRY_DELAY: Duration = Duration::from_millis(30_000);
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Wait before `attempt` (1-based). The first attempt starts immediately.
pub fn backoff_delay(attempt: u32) -> Option<Duration> {
    if attempt <= 1 {
        return None;
    }
    let exponent = (attempt - 2).min(16);
    let delay = BASE_RETRY_DELAY.saturating_mul(1 << exponent);
    Some(delay.min(MAX_RETRY_DELAY))
}

/// Produces the daily summary from collected items, or nothing.
/// Never fails: every problem is logged and reported as `None`.
pub struct Summarizer {
    provider: Option<Arc<dyn LlmProvider>>,
    budget: PromptBudget,
    max_retries: u32,
    display_offset: FixedOffset,
}

impl Summarizer {
    /// Summarizer over the configured remote endpoint. Without an API key no
    /// provider is built and `summarize` returns `None` right away.
    pub fn from_config(config: &LlmConfig, api_key: Option<String>, display_offset: FixedOffset) -> Self {
        let provider = api_key
            .filter(|key| !key.trim().is_empty())
            .map(|key| Arc::new(RemoteLlmProvider::from_config(config, key)) as Arc<dyn LlmProvider>);

        Self {
            provider,
            budget: PromptBudget {
                max_prompt_chars: config.max_prompt_chars,
                max_item_chars: config.max_item_chars,
            },
            max_retries: config.max_retries,
            display_offset,
        }
    }

    pub fn with_provider(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider: Some(provider),
            budget: PromptBudget::default(),
            max_retries: DEFAULT_MAX_RETRIES,
            display_offset: Utc.fix(),
        }
    }

    /// Summarizer that never calls out
    pub fn disabled() -> Self {
        Self {
            provider: None,
            budget: PromptBudget::default(),
            max_retries: DEFAULT_MAX_RETRIES,
            display_offset: Utc.fix(),
        }
    }

    pub fn with_budget(mut self, budget: PromptBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_display_offset(mut self, display_offset: FixedOffset) -> Self {
        self.display_offset = display_offset;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Build the budgeted prompt for `result` and ask the LLM for a summary.
    pub async fn summarize(&self, result: &[CategoryItems], timestamp: DateTime<Utc>) -> Option<String> {
        let Some(provider) = &self.provider else {
            warn!("LLM API key not set, skipping summary generation");
            return None;
        };

        let records = flatten_records(result, self.budget.max_item_chars);
        let skeleton = PromptSkeleton::daily(timestamp, self.display_offset);
        let prompt = build_prompt(&records, &skeleton, &self.budget);

        info!(
            records = records.len(),
            prompt_chars = prompt.char_len(),
            limit = self.budget.max_prompt_chars,
            reduced = prompt.reduction_ratio.is_some(),
            hard_truncated = prompt.hard_truncated,
            "summary prompt ready"
        );

        complete_with_retry(provider.as_ref(), &prompt.text, self.max_retries).await
    }
}

/// Send `prompt` up to `max_retries` times with exponential backoff.
/// Empty or whitespace-only answers count as failures.
pub async fn complete_with_retry<P: LlmProvider + ?Sized>(
    provider: &P,
    prompt: &str,
    max_retries: u32,
) -> Option<String> {
    for attempt in 1..=max_retries {
        if let Some(delay) = backoff_delay(attempt) {
            info!(attempt, max_retries, delay_ms = delay.as_millis() as u64, "retrying LLM call");
            tokio::time::sleep(delay).await;
        }

        info!(attempt, max_retries, "calling LLM");
        match provider.generate(LlmRequest::new(prompt)).await {
            Ok(response) => {
                let text = response.content.trim();
                if !text.is_empty() {
                    info!(
                        attempt,
                        chars = text.chars().count(),
                        model = %response.model,
                        total_tokens = response.usage.total_tokens,
                        "summary generated"
                    );
                    return Some(text.to_string());
                }
                warn!(attempt, "LLM returned an empty summary");
            }
            Err(e) => {
                let api_error = e.downcast_ref::<LlmApiError>();
                match api_error {
                    Some(api) => warn!(
                        attempt,
                        status = api.status,
                        body = %api.body,
                        detail = ?api.detail,
                        "LLM API call failed"
                    ),
                    None => warn!(attempt, error = %format!("{:#}", e), "LLM call failed"),
                }

                if attempt == max_retries {
                    error!(attempts = max_retries, "all LLM attempts failed");
                    if let Some(hint) = api_error.and_then(LlmApiError::hint) {
                        error!("hint: {}", hint);
                    }
                }
            }
        }
    }

    None
}
