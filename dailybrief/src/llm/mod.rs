use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod prompt;
pub mod remote;
pub mod summarizer;

/// Core trait for LLM providers
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate completion for a given prompt
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse>;
}

/// Request structure for LLM generation
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
}

impl LlmRequest {
    /// Request using the provider's defaults for everything but the prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: None,
            temperature: None,
            timeout_seconds: None,
        }
    }
}

/// Response from LLM generation
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub usage: UsageMetadata,
    pub model: String,
}

/// Token usage metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

/// Non-success HTTP answer from an LLM endpoint, with whatever the body said.
#[derive(Debug, thiserror::Error)]
#[error("LLM API error {status}: {body}")]
pub struct LlmApiError {
    pub status: u16,
    /// Raw response body
    pub body: String,
    /// The `error` member of a JSON body, when present
    pub detail: Option<serde_json::Value>,
}

impl LlmApiError {
    pub fn new(status: u16, body: String) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("error").cloned());
        Self { status, body, detail }
    }

    /// Short operator hint for the status class, if one applies
    pub fn hint(&self) -> Option<&'static str> {
        match self.status {
            400 => Some("bad request: the prompt may be too long or a generation parameter (max_tokens, model) is invalid"),
            401 | 403 => Some("authentication failed: check the API key"),
            429 => Some("rate limited: too many requests, try again later"),
            500..=599 => Some("server error: the LLM service is temporarily unavailable"),
            _ => None,
        }
    }
}
