//! Deliberately short timeout against a long generation.
//!
//! Run with:
//! ```bash
//! OLLAMA_MODEL=qwen3-vl cargo run --example short_timeout
//! ```

use std::time::Duration;

use futures::StreamExt;
use ollama_timeout::client::StreamingClient;
use ollama_timeout::config::ClientConfig;
use ollama_timeout::model::{Message, StreamChunk};
use ollama_timeout::timeout::TimeoutExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut client = ClientConfig::from_env()?.into_client()?;

    // Far too little time for a long story
    client.set_timeout(Duration::from_secs(3))?;
    // client.with_standard_timeout()?;

    let timeout = client.get_timeout()?.unwrap_or_default();
    let request = client
        .chat_stream(vec![Message::user("Write a long story about Lima, Peru, in Spanish.")])
        .await;

    let mut stream = match request {
        Ok(stream) => stream,
        Err(e) if e.is_timeout() => {
            println!("[timed out after {:?} before the first token]", timeout);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(StreamChunk::Data(message)) => print!("{}", message.content),
            Ok(StreamChunk::Finish(reason)) => println!("\n[finished: {:?}]", reason),
            Ok(StreamChunk::Usage(_)) => {}
            Err(e) if e.is_timeout() => {
                println!("\n[timed out after {:?}]", timeout);
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
