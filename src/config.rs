//! Client configuration loaded from the environment.
//!
//! | Variable         | Default                  |
//! |------------------|--------------------------|
//! | `OLLAMA_HOST`    | `http://localhost:11434` |
//! | `OLLAMA_MODEL`   | `llama3.2`               |
//! | `OLLAMA_TIMEOUT` | client default           |
//!
//! `OLLAMA_TIMEOUT` is either a preset name (`quick`, `standard`, `long`,
//! `extended`) or a whole number of seconds.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::providers::ollama::{OllamaClient, DEFAULT_ENDPOINT};
use crate::timeout::{timeout_from_secs, TimeoutError, TimeoutExt, TimeoutPreset};

pub const ENV_HOST: &str = "OLLAMA_HOST";
pub const ENV_MODEL: &str = "OLLAMA_MODEL";
pub const ENV_TIMEOUT: &str = "OLLAMA_TIMEOUT";

pub const DEFAULT_MODEL: &str = "llama3.2";

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("invalid timeout '{0}': expected a preset name or a whole number of seconds")]
    InvalidTimeout(String),

    #[error(transparent)]
    Timeout(#[from] TimeoutError),
}

/// How the request timeout should be configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutSetting {
    Preset(TimeoutPreset),
    Fixed(Duration),
}

impl TimeoutSetting {
    /// The timeout this setting resolves to.
    pub fn duration(self) -> Duration {
        match self {
            TimeoutSetting::Preset(preset) => preset.duration(),
            TimeoutSetting::Fixed(duration) => duration,
        }
    }

    /// Apply the setting to a client.
    pub fn apply<C: TimeoutExt>(self, client: &mut C) -> Result<&mut C, TimeoutError> {
        match self {
            TimeoutSetting::Preset(preset) => preset.apply(client),
            TimeoutSetting::Fixed(duration) => client.set_timeout(duration),
        }
    }
}

impl FromStr for TimeoutSetting {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(preset) = s.parse::<TimeoutPreset>() {
            return Ok(TimeoutSetting::Preset(preset));
        }
        let secs: i64 = s
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidTimeout(s.to_string()))?;
        Ok(TimeoutSetting::Fixed(timeout_from_secs(secs)?))
    }
}

/// Settings needed to build an [`OllamaClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server endpoint
    pub endpoint: Url,

    /// Default model identifier
    pub model: String,

    /// Timeout to apply, `None` keeps the client default
    pub timeout: Option<TimeoutSetting>,
}

impl ClientConfig {
    /// Create a configuration that keeps the client's default timeout.
    pub fn new(endpoint: Url, model: impl Into<String>) -> Self {
        Self {
            endpoint,
            model: model.into(),
            timeout: None,
        }
    }

    /// Set the timeout setting.
    pub fn with_timeout(mut self, timeout: TimeoutSetting) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = get(ENV_HOST).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let endpoint = parse_endpoint(&host)?;
        let model = get(ENV_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let timeout = get(ENV_TIMEOUT).map(|value| value.parse()).transpose()?;

        debug!(%endpoint, %model, ?timeout, "loaded client configuration");
        Ok(Self {
            endpoint,
            model,
            timeout,
        })
    }

    /// Build a client and apply the configured timeout.
    pub fn into_client(self) -> Result<OllamaClient, ConfigError> {
        let mut client = OllamaClient::new(self.endpoint, self.model);
        if let Some(timeout) = self.timeout {
            timeout.apply(&mut client)?;
        }
        Ok(client)
    }
}

/// Parse an endpoint, accepting the scheme-less `host:port` form Ollama itself uses.
fn parse_endpoint(host: &str) -> Result<Url, ConfigError> {
    let host = host.trim();
    if host.contains("://") {
        Ok(Url::parse(host)?)
    } else {
        Ok(Url::parse(&format!("http://{}", host))?)
    }
}
