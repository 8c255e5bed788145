//! Core client traits and error types.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;

use crate::model::{Message, Response, StreamChunk};
use crate::options::{ModelOptions, TransportOptions};
use crate::timeout::TimeoutError;

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout configuration error: {0}")]
    Timeout(#[from] TimeoutError),
}

impl ClientError {
    /// Whether the request was aborted because it exceeded the configured timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Http(e) if e.is_timeout())
    }

    /// Whether the server could not be reached at all.
    pub fn is_connect(&self) -> bool {
        matches!(self, ClientError::Http(e) if e.is_connect())
    }
}

/// Stream of chunks produced by [`StreamingClient::request_stream`].
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, ClientError>> + Send>>;

/// Access to the transport options a client applies to its requests.
///
/// This is the hook the timeout extensions in [`crate::timeout`] work through.
/// A client returns `None` when its transport is not under its control, for
/// instance when it was handed a pre-built HTTP client whose settings can no
/// longer be read or changed.
pub trait HasTransport {
    /// Provider-specific transport options type.
    type TransportProvider;

    /// Shared access to the transport options, if reachable.
    fn transport(&self) -> Option<&TransportOptions<Self::TransportProvider>>;

    /// Mutable access to the transport options, if reachable.
    fn transport_mut(&mut self) -> Option<&mut TransportOptions<Self::TransportProvider>>;
}

/// Main client trait for chat providers.
///
/// # Required Methods
/// - `request`: Sends a request with explicit model options
/// - `model_options`: Accessor for the stored model options
///
/// # Provided Methods (with default implementations)
/// - `chat`: Uses default options
/// - `chat_with_options`: Overrides model options
#[async_trait]
pub trait Client: Send + Sync {
    /// Provider-specific model options type.
    type ModelProvider: Send + Sync;

    /// Core request method that must be implemented by each provider.
    ///
    /// Transport settings (timeout, proxy, headers) come from the client itself.
    async fn request(
        &self,
        messages: Vec<Message>,
        model_options: &ModelOptions<Self::ModelProvider>,
    ) -> Result<Response, ClientError>;

    /// Get reference to the model options field.
    fn model_options(&self) -> &ModelOptions<Self::ModelProvider>;

    /// Instance method that uses default options stored in the client.
    async fn chat(&self, messages: Vec<Message>) -> Result<Response, ClientError> {
        self.request(messages, self.model_options()).await
    }

    /// Instance method that overrides default model options for one request.
    async fn chat_with_options(
        &self,
        messages: Vec<Message>,
        model_options: &ModelOptions<Self::ModelProvider>,
    ) -> Result<Response, ClientError> {
        self.request(messages, model_options).await
    }
}

/// Extension trait for streaming support.
///
/// Providers that support streaming implement this trait in addition to `Client`.
#[async_trait]
pub trait StreamingClient: Client {
    /// Returns a stream of chunks as the model generates the response.
    ///
    /// The configured timeout covers the whole stream, not only the first chunk.
    async fn request_stream(
        &self,
        messages: Vec<Message>,
        model_options: &ModelOptions<Self::ModelProvider>,
    ) -> Result<ChunkStream, ClientError>;

    /// Streaming with the client's default options.
    async fn chat_stream(&self, messages: Vec<Message>) -> Result<ChunkStream, ClientError> {
        self.request_stream(messages, self.model_options()).await
    }
}
