use common::Config;
use dailybrief::llm::remote::RemoteLlmProvider;
use dailybrief::llm::{LlmApiError, LlmProvider, LlmRequest};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let default_path = PathBuf::from("config.default.toml");
    let override_path = PathBuf::from("config.toml");
    let config = Config::load_with_defaults(Some(&default_path), Some(&override_path)).await?;

    let api_key = std::env::var(&config.llm.api_key_env)
        .map_err(|_| anyhow::anyhow!("Set the {} environment variable", config.llm.api_key_env))?;

    println!("\n{}", "=".repeat(60));
    println!("Testing LLM endpoint");
    println!("URL: {}", config.llm.api_url);
    let provider = RemoteLlmProvider::from_config(&config.llm, api_key);
    println!("Model: {}", provider.model());
    println!("{}", "=".repeat(60));

    let request = LlmRequest {
        max_tokens: Some(200),
        timeout_seconds: Some(60),
        ..LlmRequest::new("In two sentences, what is the Rust ownership model?")
    };

    match provider.generate(request).await {
        Ok(response) => {
            println!("✓ Success!");
            println!("  Model: {}", response.model);
            println!("  Answer: {}", response.content.trim());
            println!(
                "  Usage: {} tokens (prompt: {}, completion: {})",
                response.usage.total_tokens, response.usage.prompt_tokens, response.usage.completion_tokens
            );
        }
        Err(e) => {
            eprintln!("✗ Failed: {:#}", e);
            if let Some(hint) = e.downcast_ref::<LlmApiError>().and_then(LlmApiError::hint) {
                eprintln!("  Hint: {}", hint);
            }
        }
    }

    Ok(())
}
