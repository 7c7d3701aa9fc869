//! Connectivity check against the configured Azure OpenAI deployments
//!
//! Sends one chat completion and one embedding request for "ping" and prints
//! what came back.

use std::time::Duration;

use anyhow::Context;
use tool_sdk::openai::{AzureOpenAIClient, ChatCompletionRequest, ChatMessage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config_rs::load_env();

    let client = tool_sdk::azure_openai_client().context("Invalid Azure OpenAI configuration")?;
    let timeout = Duration::from_secs_f64(client.config().timeout_seconds);

    let request = ChatCompletionRequest {
        messages: vec![ChatMessage::user("ping")],
        temperature: Some(0.0),
        ..Default::default()
    };
    let chat = client
        .chat_completion(&request, Some(timeout))
        .await
        .context("Chat completion failed")?;
    println!("Chat: {}", chat.first_content().to_text());

    let embedding = embed(&client).await?;
    println!("Emb len: {}", embedding.len());

    Ok(())
}

async fn embed(client: &AzureOpenAIClient) -> anyhow::Result<Vec<f32>> {
    client.embed_text("ping").await.context("Embedding request failed")
}
