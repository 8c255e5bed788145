//! Generic options structures for model and transport configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// A secret string type for sensitive data like API keys.
/// Prevents accidental logging or display of secrets.
#[derive(Clone)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new secret string.
    pub fn new(s: String) -> Self {
        Self(s)
    }

    /// Get the underlying secret value.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s.to_string())
    }
}

/// Generic model options containing common model behavior parameters
/// and provider-specific model configuration.
///
/// # Type Parameters
/// - `T`: Provider-specific model options type
///
/// # Example
/// ```rust
/// use ollama_timeout::options::{ModelOptions, OllamaModel};
///
/// let options = ModelOptions::new(OllamaModel::default())
///     .with_model("llama3.2".to_string())
///     .with_temperature(0.7);
/// assert_eq!(options.model.as_deref(), Some("llama3.2"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelOptions<T> {
    /// Model identifier (e.g., "llama3.2", "qwen3-vl")
    pub model: Option<String>,

    // System instructions passed to the model
    pub instructions: Option<String>,

    /// Temperature for sampling
    pub temperature: Option<f32>,

    /// Top-p (nucleus) sampling parameter
    pub top_p: Option<f32>,

    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,

    /// Provider-specific model options
    pub provider: T,
}

/// Generic transport options containing truly generic transport fields
/// and provider-specific transport configuration.
///
/// `timeout` bounds a whole request, from connect until the response body
/// has been read. `None` means requests may run indefinitely.
#[derive(Debug, Clone)]
pub struct TransportOptions<T> {
    /// Request timeout (applies to all transports)
    pub timeout: Option<Duration>,

    /// Provider-specific transport options
    pub provider: T,
}

/// HTTP-specific transport options.
/// Used as the provider field in `TransportOptions<HttpTransport>`.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    /// Bearer token, for Ollama instances running behind an authenticating proxy
    pub api_key: Option<SecretString>,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in requests
    pub extra_headers: Option<HashMap<String, String>>,
}

impl HttpTransport {
    /// Set the bearer token.
    pub fn with_api_key(mut self, api_key: impl Into<SecretString>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the proxy URL.
    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
        self
    }
}

/// Ollama-specific model options.
///
/// Serialized into the `options` object of an `/api/chat` request, except
/// `keep_alive` which is a top-level request field.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OllamaModel {
    /// Context window size in tokens
    pub num_ctx: Option<u32>,

    /// Sampling seed for reproducible output
    pub seed: Option<i64>,

    /// How long the server keeps the model loaded after the request (e.g. "5m")
    pub keep_alive: Option<String>,
}

impl<T> ModelOptions<T> {
    /// Create new model options with provider-specific configuration.
    pub fn new(provider: T) -> Self {
        Self {
            model: None,
            instructions: None,
            temperature: None,
            top_p: None,
            max_tokens: None,
            provider,
        }
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }

    /// Set the system instructions.
    pub fn with_instructions(mut self, instructions: String) -> Self {
        self.instructions = Some(instructions);
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set top-p sampling parameter.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

impl<T> TransportOptions<T> {
    /// Create new transport options with provider-specific configuration.
    pub fn new(provider: T) -> Self {
        Self {
            timeout: None,
            provider,
        }
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
