use anyhow::{Context, Result};
use common::LlmConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{LlmApiError, LlmProvider, LlmRequest, LlmResponse, UsageMetadata};

/// Chat-completions client for OpenAI-compatible endpoints
pub struct RemoteLlmProvider {
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
    sampling: Sampling,
    client: reqwest::Client,
}

/// Generation parameters sent with every request unless the request overrides them
#[derive(Debug, Clone, Copy, Default)]
struct Sampling {
    max_tokens: Option<usize>,
    temperature: Option<f32>,
    top_p: Option<f32>,
    frequency_penalty: Option<f32>,
}

impl RemoteLlmProvider {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            timeout: Duration::from_secs(60),
            sampling: Sampling::default(),
            client: reqwest::Client::new(),
        }
    }

    /// Provider configured from the `[llm]` section
    pub fn from_config(config: &LlmConfig, api_key: impl Into<String>) -> Self {
        let mut provider = Self::new(&config.api_url, api_key, &config.model);
        provider.timeout = Duration::from_secs(config.timeout_seconds);
        provider.sampling = Sampling {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            frequency_penalty: config.frequency_penalty,
        };
        provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &LlmRequest) -> Result<ChatCompletion> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.body(request))
            .send()
            .await
            .context("LLM HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmApiError::new(status.as_u16(), body).into());
        }

        response
            .json::<ChatCompletion>()
            .await
            .context("Failed to parse LLM response")
    }

    fn body<'a>(&'a self, request: &'a LlmRequest) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            stream: false,
            max_tokens: request.max_tokens.or(self.sampling.max_tokens),
            temperature: request.temperature.or(self.sampling.temperature),
            top_p: self.sampling.top_p,
            frequency_penalty: self.sampling.frequency_penalty,
            n: 1,
        }
    }
}

#[async_trait::async_trait]
impl LlmProvider for RemoteLlmProvider {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse> {
        let timeout = request.timeout_seconds.map(Duration::from_secs).unwrap_or(self.timeout);
        debug!(model = %self.model, prompt_chars = request.prompt.chars().count(), ?timeout, "sending chat completion");

        let completion = tokio::time::timeout(timeout, self.complete(&request))
            .await
            .context("LLM request timed out")??;

        let ChatCompletion { model, choices, usage } = completion;
        let content = choices
            .into_iter()
            .next()
            .context("LLM response has no choices")?
            .message
            .content
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            usage: usage.map(UsageMetadata::from).unwrap_or_default(),
            model: model.unwrap_or_else(|| self.model.clone()),
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    n: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CompletionUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

impl From<CompletionUsage> for UsageMetadata {
    fn from(u: CompletionUsage) -> Self {
        UsageMetadata {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        }
    }
}
