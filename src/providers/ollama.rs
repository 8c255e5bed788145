//! Ollama chat API client implementation.
//!
//! See: <https://github.com/ollama/ollama/blob/main/docs/api.md#generate-a-chat-completion>

use std::time::Duration;

use async_trait::async_trait;
use futures::{stream, StreamExt};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::client::{ChunkStream, Client, ClientError, HasTransport, StreamingClient};
use crate::http::{apply_transport_headers, build_http_client};
use crate::model::{FinishReason, Message, Response, Role, StreamChunk, Usage};
use crate::ndjson::NdjsonResponseExt;
use crate::options::{HttpTransport, ModelOptions, OllamaModel, TransportOptions};

/// Endpoint of a locally running Ollama server.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Request timeout of a freshly constructed client.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(100);

#[derive(Debug, Clone)]
enum Transport {
    /// Options the client applies when building its HTTP client per request
    Managed(TransportOptions<HttpTransport>),
    /// Caller-supplied HTTP client, used as is
    External(reqwest::Client),
}

/// Client for an Ollama server, bound to one endpoint and a default model.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    endpoint: Url,
    model_options: ModelOptions<OllamaModel>,
    transport: Transport,
}

impl OllamaClient {
    /// Create a client for `endpoint` using `model` by default.
    ///
    /// The request timeout starts at [`DEFAULT_TIMEOUT`].
    pub fn new(endpoint: Url, model: impl Into<String>) -> Self {
        Self {
            endpoint,
            model_options: ModelOptions::new(OllamaModel::default()).with_model(model.into()),
            transport: Transport::Managed(
                TransportOptions::new(HttpTransport::default()).with_timeout(DEFAULT_TIMEOUT),
            ),
        }
    }

    /// Create a client for the Ollama server at [`DEFAULT_ENDPOINT`].
    pub fn localhost(model: impl Into<String>) -> Self {
        let endpoint = Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL");
        Self::new(endpoint, model)
    }

    /// Create a client that sends requests through a pre-built HTTP client.
    ///
    /// Its settings, timeout included, are opaque: the timeout extensions
    /// cannot read or change them.
    pub fn with_http_client(endpoint: Url, model: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            transport: Transport::External(http),
            ..Self::new(endpoint, model)
        }
    }

    /// Replace the default model options.
    pub fn with_model_options(mut self, model_options: ModelOptions<OllamaModel>) -> Self {
        self.model_options = model_options;
        self
    }

    /// Replace the transport options, taking over from any external HTTP client.
    pub fn with_transport_options(mut self, transport_options: TransportOptions<HttpTransport>) -> Self {
        self.transport = Transport::Managed(transport_options);
        self
    }

    /// Server endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Default model identifier.
    pub fn model(&self) -> Option<&str> {
        self.model_options.model.as_deref()
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.endpoint.as_str().trim_end_matches('/'))
    }

    fn build_request(
        &self,
        messages: Vec<Message>,
        model_options: &ModelOptions<OllamaModel>,
        stream: bool,
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        let model = model_options
            .model
            .clone()
            .ok_or_else(|| ClientError::Config("Model must be specified".to_string()))?;

        let url = self.chat_url();
        let request_body = OllamaRequest::new(messages, model_options, model, stream);

        let req = match &self.transport {
            Transport::Managed(options) => {
                debug!(%url, model = %request_body.model, stream, timeout = ?options.timeout, "sending chat request");
                let http_client = build_http_client(options)?;
                apply_transport_headers(http_client.post(&url), &options.provider)
            }
            Transport::External(http_client) => {
                debug!(%url, model = %request_body.model, stream, "sending chat request through external client");
                http_client.post(&url)
            }
        };

        Ok(req.header(CONTENT_TYPE, "application/json").json(&request_body))
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::handle_error_response(status, &body));
        }
        Ok(response)
    }

    /// Handle Ollama error responses.
    fn handle_error_response(status: reqwest::StatusCode, body: &str) -> ClientError {
        if let Ok(error_resp) = serde_json::from_str::<OllamaErrorResponse>(body) {
            ClientError::ProviderError(format!("Ollama error ({}): {}", status, error_resp.error))
        } else {
            ClientError::ProviderError(format!("HTTP {}: {}", status, body))
        }
    }

    fn process_stream(response: reqwest::Response) -> ChunkStream {
        let chunks = response.ndjson_lines().flat_map(|line| {
            let parsed = line.and_then(|line| {
                serde_json::from_str::<OllamaStreamLine>(&line).map_err(ClientError::Parse)
            });

            let chunks: Vec<Result<StreamChunk, ClientError>> = match parsed {
                Ok(OllamaStreamLine::Chunk(chunk)) => {
                    chunk.into_stream_chunks().into_iter().map(Ok).collect()
                }
                Ok(OllamaStreamLine::Error(err)) => vec![Err(ClientError::ProviderError(format!(
                    "Ollama error: {}",
                    err.error
                )))],
                Err(e) => vec![Err(e)],
            };
            stream::iter(chunks)
        });

        Box::pin(chunks)
    }
}

impl HasTransport for OllamaClient {
    type TransportProvider = HttpTransport;

    fn transport(&self) -> Option<&TransportOptions<HttpTransport>> {
        match &self.transport {
            Transport::Managed(options) => Some(options),
            Transport::External(_) => None,
        }
    }

    fn transport_mut(&mut self) -> Option<&mut TransportOptions<HttpTransport>> {
        match &mut self.transport {
            Transport::Managed(options) => Some(options),
            Transport::External(_) => None,
        }
    }
}

#[async_trait]
impl Client for OllamaClient {
    type ModelProvider = OllamaModel;

    async fn request(
        &self,
        messages: Vec<Message>,
        model_options: &ModelOptions<Self::ModelProvider>,
    ) -> Result<Response, ClientError> {
        let req = self.build_request(messages, model_options, false)?;
        let response = self.send(req).await?;

        let ollama_response: OllamaChatResponse = response.json().await?;
        Ok(ollama_response.into())
    }

    fn model_options(&self) -> &ModelOptions<Self::ModelProvider> {
        &self.model_options
    }
}

#[async_trait]
impl StreamingClient for OllamaClient {
    async fn request_stream(
        &self,
        messages: Vec<Message>,
        model_options: &ModelOptions<Self::ModelProvider>,
    ) -> Result<ChunkStream, ClientError> {
        let req = self.build_request(messages, model_options, true)?;
        let response = self.send(req).await?;
        Ok(Self::process_stream(response))
    }
}

// --- Ollama API Request/Response Types ---

#[derive(Debug, Clone, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaRequestOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<String>,
}

impl OllamaRequest {
    fn new(
        messages: Vec<Message>,
        model_options: &ModelOptions<OllamaModel>,
        model: String,
        stream: bool,
    ) -> Self {
        let messages = model_options
            .instructions
            .iter()
            .map(|instructions| Message::system(instructions.clone()))
            .chain(messages)
            .collect();

        let options = OllamaRequestOptions {
            temperature: model_options.temperature,
            top_p: model_options.top_p,
            num_predict: model_options.max_tokens,
            num_ctx: model_options.provider.num_ctx,
            seed: model_options.provider.seed,
        };

        OllamaRequest {
            model,
            messages,
            stream,
            options: (!options.is_empty()).then_some(options),
            keep_alive: model_options.provider.keep_alive.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct OllamaRequestOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_ctx: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
}

impl OllamaRequestOptions {
    fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.top_p.is_none()
            && self.num_predict.is_none()
            && self.num_ctx.is_none()
            && self.seed.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct OllamaChatResponse {
    #[serde(default)]
    message: Option<Message>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

impl OllamaChatResponse {
    fn usage(&self) -> Option<Usage> {
        if self.prompt_eval_count.is_none() && self.eval_count.is_none() {
            return None;
        }
        Some(Usage {
            prompt_tokens: self.prompt_eval_count,
            completion_tokens: self.eval_count,
        })
    }

    fn finish_reason(&self) -> FinishReason {
        match self.done_reason.as_deref() {
            None | Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some(_) => FinishReason::Other,
        }
    }

    fn into_stream_chunks(self) -> Vec<StreamChunk> {
        let mut chunks = Vec::new();
        let usage = self.usage();
        let finish = self.finish_reason();

        if let Some(message) = self.message.filter(|m| !m.content.is_empty()) {
            chunks.push(StreamChunk::Data(message));
        }
        if self.done {
            if let Some(usage) = usage {
                chunks.push(StreamChunk::Usage(usage));
            }
            chunks.push(StreamChunk::Finish(finish));
        }
        chunks
    }
}

impl From<OllamaChatResponse> for Response {
    fn from(resp: OllamaChatResponse) -> Self {
        let usage = resp.usage();
        let finish = resp.finish_reason();
        let data = resp
            .message
            .map(|m| Message {
                role: Role::Assistant,
                content: m.content,
            })
            .into_iter()
            .collect();

        Response { data, usage, finish }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct OllamaErrorResponse {
    error: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OllamaStreamLine {
    Error(OllamaErrorResponse),
    Chunk(OllamaChatResponse),
}
