//! Walk through the timeout extensions, then try a real chat.
//!
//! Run with:
//! ```bash
//! RUST_LOG=ollama_timeout=debug cargo run --example timeout_demo
//! ```
//!
//! The final chat needs an Ollama server (see `OLLAMA_HOST`, `OLLAMA_MODEL`).

use std::time::Duration;

use ollama_timeout::client::{Client, ClientError};
use ollama_timeout::config::ClientConfig;
use ollama_timeout::model::{Message, Response};
use ollama_timeout::providers::OllamaClient;
use ollama_timeout::timeout::{TimeoutExt, TimeoutPreset, STANDARD_TIMEOUT};
use tracing_subscriber::EnvFilter;

fn fresh_client(config: &ClientConfig) -> OllamaClient {
    OllamaClient::new(config.endpoint.clone(), config.model.clone())
}

/// Story generation can run long, so make sure the client allows at least
/// the standard timeout before sending.
async fn write_story(client: &mut OllamaClient) -> Result<Response, ClientError> {
    let too_short = client.get_timeout()?.map_or(true, |t| t < STANDARD_TIMEOUT);
    if too_short {
        client.with_standard_timeout()?;
    }

    let messages = vec![
        Message::system("Write short stories that are engaging and creative, and always add bad jokes to them."),
        Message::user("Write a very short story about a developer learning Rust."),
    ];
    client.chat(messages).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ClientConfig::from_env()?;
    println!("=== Ollama timeout demo ({} / {}) ===\n", config.endpoint, config.model);

    let mut client = fresh_client(&config);
    println!("Default timeout: {:?}", client.get_timeout()?);

    println!("\n--- Fluent configuration ---");
    let mut fluent = fresh_client(&config);
    fluent.set_timeout(Duration::from_secs(5 * 60))?;
    println!("Fluent client timeout: {:?}", fluent.get_timeout()?);

    for preset in TimeoutPreset::ALL {
        let mut preset_client = fresh_client(&config);
        preset.apply(&mut preset_client)?;
        println!("{:>8} timeout: {:?}", preset, preset_client.get_timeout()?);
    }

    println!("\n--- Functional configuration ---");
    let mut configured = fresh_client(&config);
    configured.configure_timeout(|current| match current {
        Some(timeout) => timeout * 2,
        None => Duration::from_secs(5 * 60),
    })?;
    println!("Doubled timeout: {:?}", configured.get_timeout()?);

    client.set_timeout(Duration::from_secs(10 * 60))?;
    println!("Updated default client timeout: {:?}", client.get_timeout()?);

    println!("\n--- Chat request ---");
    let mut chat_client = config.clone().into_client()?;
    println!("Request timeout: {:?}", chat_client.get_timeout()?);

    match write_story(&mut chat_client).await {
        Ok(response) => {
            println!("Response:\n{}", response.text());
        }
        Err(e) if e.is_timeout() => {
            println!("Request timed out: {}", e);
            println!("Consider a longer preset such as `with_extended_timeout()`.");
        }
        Err(e) if e.is_connect() => {
            println!("Connection error: {}", e);
            println!("Make sure Ollama is running at {} with model {}.", config.endpoint, config.model);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
        }
    }

    Ok(())
}
