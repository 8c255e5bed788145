//! # ollama-timeout - request timeouts for Ollama chat clients
//!
//! Long generations on a local Ollama server easily outlast the usual HTTP
//! client timeout. This crate provides a chat client for Ollama together with
//! fluent extensions to read and change its request timeout.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - `get_timeout`, `set_timeout` and `configure_timeout` on any client that
//!   exposes its transport options
//! - Presets for quick (2 min), standard (5 min), long (10 min) and
//!   extended (30 min) requests
//! - Streaming support via newline-delimited JSON
//! - Environment-based configuration
//!
//! ## Example
//! ```no_run
//! use ollama_timeout::client::Client;
//! use ollama_timeout::model::Message;
//! use ollama_timeout::providers::OllamaClient;
//! use ollama_timeout::timeout::TimeoutExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = OllamaClient::localhost("llama3.2");
//!     client.with_long_timeout()?;
//!
//!     let response = client
//!         .chat(vec![Message::user("Write a long story about Lima, Peru.")])
//!         .await?;
//!     println!("{}", response.text());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod http;
pub mod model;
pub mod ndjson;
pub mod options;
pub mod providers;
pub mod timeout;

// Re-exports for convenience
pub use client::{Client, ClientError, HasTransport, StreamingClient};
pub use config::{ClientConfig, ConfigError};
pub use model::{Message, Response, StreamChunk};
pub use providers::OllamaClient;
pub use timeout::{TimeoutError, TimeoutExt, TimeoutPreset};
