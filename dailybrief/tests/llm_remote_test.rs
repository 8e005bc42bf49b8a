use common::LlmConfig;
use dailybrief::llm::remote::RemoteLlmProvider;
use dailybrief::llm::{LlmApiError, LlmProvider, LlmRequest};
use mockito::Matcher;
use serde_json::json;

#[tokio::test]
async fn test_remote_provider_with_mock() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/")
        .match_header("authorization", "Bearer fake-api-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r###"{
                "model": "deepseek-ai/DeepSeek-V3.2-served",
                "choices": [{"message": {"role": "assistant", "content": "## AI\n- new model released"}}],
                "usage": {"prompt_tokens": 1200, "completion_tokens": 80, "total_tokens": 1280}
            }"###,
        )
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "deepseek-ai/DeepSeek-V3.2");
    let response = provider.generate(LlmRequest::new("Summarize today")).await.unwrap();

    assert_eq!(response.content, "## AI\n- new model released");
    assert_eq!(response.usage.total_tokens, 1280);
    // The served model name wins over the configured one.
    assert_eq!(response.model, "deepseek-ai/DeepSeek-V3.2-served");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_provider_tolerates_sparse_response() {
    let mut server = mockito::Server::new_async().await;

    // No model, no usage and a null message content
    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "configured-model");
    let response = provider.generate(LlmRequest::new("Summarize today")).await.unwrap();

    assert_eq!(response.content, "");
    assert_eq!(response.usage.prompt_tokens, 0);
    assert_eq!(response.usage.total_tokens, 0);
    assert_eq!(response.model, "configured-model");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_provider_sends_configured_parameters() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::PartialJson(json!({
            "model": "test-model",
            "stream": false,
            "n": 1,
            "max_tokens": 32767,
            "messages": [{"role": "user", "content": "Summarize"}]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices": [{"message": {"content": "done"}}]}"#)
        .create_async()
        .await;

    let config = LlmConfig {
        api_url: format!("{}/v1/chat/completions", server.url()),
        model: "test-model".to_string(),
        ..LlmConfig::default()
    };
    let provider = RemoteLlmProvider::from_config(&config, "key");

    let response = provider.generate(LlmRequest::new("Summarize")).await.unwrap();

    // Missing usage and model fall back to defaults
    assert_eq!(response.content, "done");
    assert_eq!(response.usage.total_tokens, 0);
    assert_eq!(response.model, "test-model");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_provider_error_handling() {
    let mut server = mockito::Server::new_async().await;

    // Mock API error
    let mock = server
        .mock("POST", "/")
        .with_status(429)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": {"message": "Rate limit exceeded"}}"#)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "test-model");

    let result = provider.generate(LlmRequest::new("Test")).await;

    assert!(result.is_err());
    let err = result.unwrap_err();
    assert!(err.to_string().contains("429"));

    let api = err.downcast_ref::<LlmApiError>().expect("typed API error");
    assert_eq!(api.status, 429);
    assert_eq!(api.detail.as_ref().unwrap()["message"], "Rate limit exceeded");
    assert!(api.hint().unwrap().contains("rate limited"));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_remote_provider_empty_choices_is_an_error() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices": []}"#)
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "test-model");
    let err = provider.generate(LlmRequest::new("Test")).await.unwrap_err();

    assert!(err.to_string().contains("no choices"));
}

#[tokio::test]
async fn test_remote_provider_timeout() {
    let mut server = mockito::Server::new_async().await;

    // Mock slow response
    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(std::time::Duration::from_secs(3));
            w.write_all(b"too late")
        })
        .create_async()
        .await;

    let provider = RemoteLlmProvider::new(server.url(), "fake-api-key", "test-model");

    let request = LlmRequest {
        prompt: "Test".to_string(),
        max_tokens: None,
        temperature: None,
        timeout_seconds: Some(1), // 1 second timeout
    };

    let result = provider.generate(request).await;

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("timed out"));
}
