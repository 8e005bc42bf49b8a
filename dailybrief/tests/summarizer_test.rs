use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use common::{LlmConfig, SourceType};
use dailybrief::llm::prompt::{PromptBudget, TRUNCATION_NOTICE};
use dailybrief::llm::summarizer::{complete_with_retry, Summarizer};
use dailybrief::llm::{LlmApiError, LlmProvider, LlmRequest, LlmResponse, UsageMetadata};
use dailybrief::model::{CategoryItems, ContentType, NewsItem};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Replays scripted answers and records when each call happened.
struct ScriptedProvider {
    answers: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<Vec<(Instant, String)>>,
}

impl ScriptedProvider {
    fn new(answers: Vec<Result<String>>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        self.calls.lock().unwrap().push((Instant::now(), request.prompt));
        let next = self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("script exhausted")));
        next.map(|content| LlmResponse {
            content,
            usage: UsageMetadata::default(),
            model: "scripted".to_string(),
        })
    }
}

fn run_result() -> Vec<CategoryItems> {
    vec![CategoryItems {
        category: "AI".to_string(),
        items: vec![NewsItem {
            title: "New model released".to_string(),
            link: "https://example.com/model".to_string(),
            source: "Example".to_string(),
            source_type: SourceType::Blog,
            snippet: "A new open-weights model.".to_string(),
            full_content: None,
            content_type: ContentType::RssSnippet,
        }],
    }]
}

fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-01T01:00:00Z").unwrap().with_timezone(&Utc)
}

#[tokio::test(start_paused = true)]
async fn two_failures_then_ok_backs_off_two_then_four_seconds() {
    let provider = ScriptedProvider::new(vec![
        Err(anyhow::anyhow!("connection reset")),
        Err(LlmApiError::new(503, "unavailable".to_string()).into()),
        Ok("ok".to_string()),
    ]);
    let summarizer = Summarizer::with_provider(provider.clone());

    let summary = summarizer.summarize(&run_result(), now()).await;

    assert_eq!(summary.as_deref(), Some("ok"));
    let times = provider.call_times();
    assert_eq!(times.len(), 3);

    let first_gap = times[1] - times[0];
    let second_gap = times[2] - times[1];
    assert!(first_gap >= Duration::from_millis(2_000) && first_gap < Duration::from_millis(2_100));
    assert!(second_gap >= Duration::from_millis(4_000) && second_gap < Duration::from_millis(4_100));
}

#[tokio::test(start_paused = true)]
async fn blank_answers_are_retried_and_text_is_trimmed() {
    let provider = ScriptedProvider::new(vec![Ok("   \n".to_string()), Ok("  summary text \n".to_string())]);

    let summary = complete_with_retry(provider.as_ref(), "prompt", 5).await;

    assert_eq!(summary.as_deref(), Some("summary text"));
    assert_eq!(provider.call_times().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_max_retries() {
    let provider = ScriptedProvider::new(vec![
        Err(LlmApiError::new(429, r#"{"error": {"message": "slow down"}}"#.to_string()).into()),
        Err(LlmApiError::new(429, "slow down".to_string()).into()),
        Err(LlmApiError::new(429, "slow down".to_string()).into()),
    ]);
    let summarizer = Summarizer::with_provider(provider.clone()).with_max_retries(3);

    let summary = summarizer.summarize(&run_result(), now()).await;

    assert!(summary.is_none());
    assert_eq!(provider.call_times().len(), 3);
}

#[tokio::test]
async fn zero_retries_never_calls_the_provider() {
    let provider = ScriptedProvider::new(vec![Ok("unused".to_string())]);
    let summarizer = Summarizer::with_provider(provider.clone()).with_max_retries(0);

    assert!(summarizer.summarize(&run_result(), now()).await.is_none());
    assert!(provider.call_times().is_empty());
}

#[tokio::test]
async fn missing_api_key_makes_no_network_calls() {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("POST", mockito::Matcher::Any).expect(0).create_async().await;

    let config = LlmConfig {
        api_url: server.url(),
        ..LlmConfig::default()
    };
    let summarizer = Summarizer::from_config(&config, None, FixedOffset::east_opt(0).unwrap());

    assert!(summarizer.summarize(&run_result(), now()).await.is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn prompt_carries_items_and_respects_budget() {
    let provider = ScriptedProvider::new(vec![Ok("fine".to_string())]);
    let summarizer = Summarizer::with_provider(provider.clone());

    summarizer.summarize(&run_result(), now()).await;

    let prompts = provider.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("[AI]"));
    assert!(prompts[0].contains("New model released (source: Example)"));
    assert!(prompts[0].contains("A new open-weights model."));
    assert!(prompts[0].contains("2024-05-01T01:00:00+00:00"));
    assert!(!prompts[0].contains("https://example.com/model"));
}

#[tokio::test]
async fn tiny_budget_still_sends_a_bounded_prompt() {
    let provider = ScriptedProvider::new(vec![Ok("fine".to_string())]);
    let budget = PromptBudget {
        max_prompt_chars: 400,
        max_item_chars: 800,
    };
    let summarizer = Summarizer::with_provider(provider.clone()).with_budget(budget);

    summarizer.summarize(&run_result(), now()).await;

    let prompt = &provider.prompts()[0];
    assert!(prompt.ends_with(TRUNCATION_NOTICE));
    assert!(prompt.chars().count() <= 400 - 100 + TRUNCATION_NOTICE.chars().count());
}
