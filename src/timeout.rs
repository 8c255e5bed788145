//! Fluent timeout configuration for chat clients.
//!
//! [`TimeoutExt`] is implemented for every client that exposes its transport
//! options through [`HasTransport`], and for `Option<C>` of such clients so
//! callers holding a possibly-missing client get [`TimeoutError::NullClient`]
//! instead of having to unwrap first.
//!
//! Reading is best effort: [`TimeoutExt::get_timeout`] returns `Ok(None)` when
//! the transport cannot be reached. Writing is not: [`TimeoutExt::set_timeout`]
//! fails with [`TimeoutError::TransportUnavailable`], because a silently
//! dropped timeout would leave long requests unprotected.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use ollama_timeout::providers::OllamaClient;
//! use ollama_timeout::timeout::{TimeoutError, TimeoutExt};
//!
//! # fn main() -> Result<(), TimeoutError> {
//! let mut client = OllamaClient::localhost("llama3.2");
//! client
//!     .with_quick_timeout()?
//!     .configure_timeout(|current| current.map_or(Duration::from_secs(300), |t| t * 2))?;
//! assert_eq!(client.get_timeout()?, Some(Duration::from_secs(240)));
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::client::HasTransport;

/// Timeout for quick queries.
pub const QUICK_TIMEOUT: Duration = Duration::from_secs(2 * 60);

/// Timeout for standard prompts.
pub const STANDARD_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Timeout for long-form generation.
pub const LONG_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Timeout for very large models or slow hardware.
pub const EXTENDED_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Errors raised while reading or changing a client's timeout.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeoutError {
    #[error("client is absent")]
    NullClient,

    #[error("timeout must be greater than zero, got {0}")]
    InvalidTimeout(String),

    #[error("timeout transform is absent")]
    NullTransform,

    #[error("unable to access the client's transport options, the timeout cannot be applied")]
    TransportUnavailable,
}

/// Convert a signed number of seconds into a timeout.
///
/// Zero and negative values are rejected with [`TimeoutError::InvalidTimeout`].
pub fn timeout_from_secs(secs: i64) -> Result<Duration, TimeoutError> {
    if secs <= 0 {
        return Err(TimeoutError::InvalidTimeout(format!("{}s", secs)));
    }
    Ok(Duration::from_secs(secs.unsigned_abs()))
}

fn validate(timeout: Duration) -> Result<Duration, TimeoutError> {
    if timeout.is_zero() {
        return Err(TimeoutError::InvalidTimeout(format!("{:?}", timeout)));
    }
    Ok(timeout)
}

/// Timeout configuration methods for client handles.
///
/// Every mutator returns the same handle, so calls chain:
/// `client.with_quick_timeout()?.set_timeout(d)?` leaves `d` in place.
pub trait TimeoutExt {
    /// Set the request timeout, overwriting any previous value.
    ///
    /// Nothing is changed when an error is returned.
    fn set_timeout(&mut self, timeout: Duration) -> Result<&mut Self, TimeoutError>;

    /// Current request timeout, or `None` if it cannot be determined.
    fn get_timeout(&self) -> Result<Option<Duration>, TimeoutError>;

    /// Compute a new timeout from the current one and apply it.
    ///
    /// `None` as the transform fails with [`TimeoutError::NullTransform`].
    /// Errors from [`set_timeout`](TimeoutExt::set_timeout) propagate unchanged.
    fn try_configure_timeout<F>(&mut self, transform: Option<F>) -> Result<&mut Self, TimeoutError>
    where
        F: FnOnce(Option<Duration>) -> Duration,
    {
        let current = self.get_timeout()?;
        let transform = transform.ok_or(TimeoutError::NullTransform)?;
        self.set_timeout(transform(current))
    }

    /// Compute a new timeout from the current one and apply it.
    fn configure_timeout<F>(&mut self, transform: F) -> Result<&mut Self, TimeoutError>
    where
        F: FnOnce(Option<Duration>) -> Duration,
    {
        self.try_configure_timeout(Some(transform))
    }

    /// Set a timeout suitable for quick queries (2 minutes).
    fn with_quick_timeout(&mut self) -> Result<&mut Self, TimeoutError> {
        self.set_timeout(QUICK_TIMEOUT)
    }

    /// Set a timeout suitable for standard prompts (5 minutes).
    fn with_standard_timeout(&mut self) -> Result<&mut Self, TimeoutError> {
        self.set_timeout(STANDARD_TIMEOUT)
    }

    /// Set a timeout suitable for long-form generation (10 minutes).
    fn with_long_timeout(&mut self) -> Result<&mut Self, TimeoutError> {
        self.set_timeout(LONG_TIMEOUT)
    }

    /// Set a timeout suitable for very large models or slow hardware (30 minutes).
    fn with_extended_timeout(&mut self) -> Result<&mut Self, TimeoutError> {
        self.set_timeout(EXTENDED_TIMEOUT)
    }
}

impl<C: HasTransport> TimeoutExt for C {
    fn set_timeout(&mut self, timeout: Duration) -> Result<&mut Self, TimeoutError> {
        let timeout = validate(timeout)?;
        let transport = self
            .transport_mut()
            .ok_or(TimeoutError::TransportUnavailable)?;
        debug!(previous = ?transport.timeout, new = ?timeout, "updating request timeout");
        transport.timeout = Some(timeout);
        Ok(self)
    }

    fn get_timeout(&self) -> Result<Option<Duration>, TimeoutError> {
        match self.transport() {
            Some(transport) => Ok(transport.timeout),
            None => {
                warn!("transport options not reachable, timeout unknown");
                Ok(None)
            }
        }
    }
}

impl<C: HasTransport> TimeoutExt for Option<C> {
    fn set_timeout(&mut self, timeout: Duration) -> Result<&mut Self, TimeoutError> {
        self.as_mut()
            .ok_or(TimeoutError::NullClient)?
            .set_timeout(timeout)?;
        Ok(self)
    }

    fn get_timeout(&self) -> Result<Option<Duration>, TimeoutError> {
        self.as_ref().ok_or(TimeoutError::NullClient)?.get_timeout()
    }
}

/// Named timeout presets, selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeoutPreset {
    Quick,
    Standard,
    Long,
    Extended,
}

impl TimeoutPreset {
    /// All presets, shortest first.
    pub const ALL: [TimeoutPreset; 4] = [
        TimeoutPreset::Quick,
        TimeoutPreset::Standard,
        TimeoutPreset::Long,
        TimeoutPreset::Extended,
    ];

    /// The timeout this preset applies.
    pub fn duration(self) -> Duration {
        match self {
            TimeoutPreset::Quick => QUICK_TIMEOUT,
            TimeoutPreset::Standard => STANDARD_TIMEOUT,
            TimeoutPreset::Long => LONG_TIMEOUT,
            TimeoutPreset::Extended => EXTENDED_TIMEOUT,
        }
    }

    /// Apply the preset through the matching `with_*_timeout` method.
    pub fn apply<C: TimeoutExt>(self, client: &mut C) -> Result<&mut C, TimeoutError> {
        match self {
            TimeoutPreset::Quick => client.with_quick_timeout(),
            TimeoutPreset::Standard => client.with_standard_timeout(),
            TimeoutPreset::Long => client.with_long_timeout(),
            TimeoutPreset::Extended => client.with_extended_timeout(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            TimeoutPreset::Quick => "quick",
            TimeoutPreset::Standard => "standard",
            TimeoutPreset::Long => "long",
            TimeoutPreset::Extended => "extended",
        }
    }
}

impl fmt::Display for TimeoutPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Error returned when a preset name is not recognised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown timeout preset '{0}' (expected quick, standard, long or extended)")]
pub struct ParsePresetError(pub String);

impl FromStr for TimeoutPreset {
    type Err = ParsePresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParsePresetError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{HttpTransport, TransportOptions};
    use crate::providers::OllamaClient;
    use crate::providers::ollama::DEFAULT_TIMEOUT;

    fn test_client() -> OllamaClient {
        OllamaClient::localhost("test-model")
    }

    /// Client whose transport lives somewhere the extensions cannot reach.
    struct OpaqueClient;

    impl HasTransport for OpaqueClient {
        type TransportProvider = HttpTransport;

        fn transport(&self) -> Option<&TransportOptions<HttpTransport>> {
            None
        }

        fn transport_mut(&mut self) -> Option<&mut TransportOptions<HttpTransport>> {
            None
        }
    }

    #[test]
    fn test_set_timeout_then_get_returns_value() {
        let mut client = test_client();
        client.set_timeout(Duration::from_secs(7 * 60)).unwrap();
        assert_eq!(client.get_timeout().unwrap(), Some(Duration::from_secs(7 * 60)));
    }

    #[test]
    fn test_set_timeout_returns_same_instance() {
        let mut client = test_client();
        let original: *const OllamaClient = &client;
        let returned = client.set_timeout(Duration::from_secs(600)).unwrap();
        assert!(std::ptr::eq(returned, original));
    }

    #[test]
    fn test_set_timeout_zero_is_rejected_and_keeps_previous() {
        let mut client = test_client();
        client.set_timeout(QUICK_TIMEOUT).unwrap();

        let err = client.set_timeout(Duration::ZERO).unwrap_err();
        assert!(matches!(err, TimeoutError::InvalidTimeout(_)));
        assert_eq!(client.get_timeout().unwrap(), Some(QUICK_TIMEOUT));
    }

    #[test]
    fn test_timeout_from_secs_rejects_negative_and_zero() {
        assert!(matches!(timeout_from_secs(-1), Err(TimeoutError::InvalidTimeout(_))));
        assert!(matches!(timeout_from_secs(0), Err(TimeoutError::InvalidTimeout(_))));
        assert_eq!(timeout_from_secs(90).unwrap(), Duration::from_secs(90));
    }

    #[test]
    fn test_get_timeout_on_new_client_returns_default() {
        let client = test_client();
        let timeout = client.get_timeout().unwrap().unwrap();
        assert_eq!(timeout, DEFAULT_TIMEOUT);
        assert!(timeout > Duration::ZERO);
    }

    #[test]
    fn test_absent_client_is_rejected_everywhere() {
        let mut client: Option<OllamaClient> = None;

        assert_eq!(client.set_timeout(LONG_TIMEOUT).unwrap_err(), TimeoutError::NullClient);
        assert_eq!(client.get_timeout().unwrap_err(), TimeoutError::NullClient);
        assert_eq!(
            client.configure_timeout(|_| STANDARD_TIMEOUT).unwrap_err(),
            TimeoutError::NullClient
        );
        assert_eq!(client.with_quick_timeout().unwrap_err(), TimeoutError::NullClient);
        assert_eq!(client.with_standard_timeout().unwrap_err(), TimeoutError::NullClient);
        assert_eq!(client.with_long_timeout().unwrap_err(), TimeoutError::NullClient);
        assert_eq!(client.with_extended_timeout().unwrap_err(), TimeoutError::NullClient);
    }

    #[test]
    fn test_present_optional_client_is_configured() {
        let mut client = Some(test_client());
        client.with_long_timeout().unwrap();
        assert_eq!(client.get_timeout().unwrap(), Some(LONG_TIMEOUT));
    }

    #[test]
    fn test_missing_transform_is_rejected() {
        let mut client = test_client();
        let err = client
            .try_configure_timeout(None::<fn(Option<Duration>) -> Duration>)
            .unwrap_err();
        assert_eq!(err, TimeoutError::NullTransform);
        assert_eq!(client.get_timeout().unwrap(), Some(DEFAULT_TIMEOUT));
    }

    #[test]
    fn test_absent_client_checked_before_transform() {
        let mut client: Option<OllamaClient> = None;
        let err = client
            .try_configure_timeout(None::<fn(Option<Duration>) -> Duration>)
            .unwrap_err();
        assert_eq!(err, TimeoutError::NullClient);
    }

    #[test]
    fn test_configure_timeout_doubles_current_value() {
        let mut client = test_client();
        client.set_timeout(QUICK_TIMEOUT).unwrap();

        let original: *const OllamaClient = &client;
        let returned = client
            .configure_timeout(|current| current.map_or(STANDARD_TIMEOUT, |t| t * 2))
            .unwrap();
        assert!(std::ptr::eq(returned, original));
        assert_eq!(client.get_timeout().unwrap(), Some(Duration::from_secs(4 * 60)));
    }

    #[test]
    fn test_configure_timeout_with_absent_current_uses_fallback() {
        let mut client = OllamaClient::localhost("test-model")
            .with_transport_options(TransportOptions::new(HttpTransport::default()));
        assert_eq!(client.get_timeout().unwrap(), None);

        client
            .configure_timeout(|current| current.unwrap_or(STANDARD_TIMEOUT))
            .unwrap();
        assert_eq!(client.get_timeout().unwrap(), Some(STANDARD_TIMEOUT));
    }

    #[test]
    fn test_configure_timeout_propagates_invalid_result() {
        let mut client = test_client();
        let err = client.configure_timeout(|_| Duration::ZERO).unwrap_err();
        assert!(matches!(err, TimeoutError::InvalidTimeout(_)));
        assert_eq!(client.get_timeout().unwrap(), Some(DEFAULT_TIMEOUT));
    }

    #[test]
    fn test_unreachable_transport_reads_none_but_fails_writes() {
        let mut client = OpaqueClient;
        assert_eq!(client.get_timeout().unwrap(), None);
        assert_eq!(
            client.set_timeout(STANDARD_TIMEOUT).err(),
            Some(TimeoutError::TransportUnavailable)
        );
        assert_eq!(
            client.with_extended_timeout().err(),
            Some(TimeoutError::TransportUnavailable)
        );
    }

    #[test]
    fn test_invalid_timeout_reported_before_unreachable_transport() {
        let mut client = OpaqueClient;
        assert!(matches!(
            client.set_timeout(Duration::ZERO).err(),
            Some(TimeoutError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn test_presets_set_expected_durations() {
        let cases = [
            (TimeoutPreset::Quick, Duration::from_secs(120)),
            (TimeoutPreset::Standard, Duration::from_secs(300)),
            (TimeoutPreset::Long, Duration::from_secs(600)),
            (TimeoutPreset::Extended, Duration::from_secs(1800)),
        ];
        for (preset, expected) in cases {
            let mut client = test_client();
            let original: *const OllamaClient = &client;
            let returned = preset.apply(&mut client).unwrap();
            assert!(std::ptr::eq(returned, original));
            assert_eq!(client.get_timeout().unwrap(), Some(expected), "{preset}");
        }
    }

    #[test]
    fn test_presets_are_ordered() {
        let timeouts: Vec<Duration> = TimeoutPreset::ALL
            .into_iter()
            .map(|preset| {
                let mut client = test_client();
                preset.apply(&mut client).unwrap();
                client.get_timeout().unwrap().unwrap()
            })
            .collect();
        assert!(timeouts.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_chained_calls_last_write_wins() {
        let mut client = test_client();
        client
            .with_quick_timeout()
            .unwrap()
            .set_timeout(Duration::from_secs(7 * 60))
            .unwrap();
        assert_eq!(client.get_timeout().unwrap(), Some(Duration::from_secs(7 * 60)));

        client.with_quick_timeout().unwrap();
        client.with_extended_timeout().unwrap();
        assert_eq!(client.get_timeout().unwrap(), Some(EXTENDED_TIMEOUT));
    }

    #[test]
    fn test_set_timeout_is_idempotent() {
        let mut client = test_client();
        client.set_timeout(LONG_TIMEOUT).unwrap();
        client.set_timeout(LONG_TIMEOUT).unwrap();
        assert_eq!(client.get_timeout().unwrap(), Some(LONG_TIMEOUT));
    }

    #[test]
    fn test_extreme_but_valid_timeouts() {
        let mut client = test_client();
        client.set_timeout(Duration::from_millis(1)).unwrap();
        assert_eq!(client.get_timeout().unwrap(), Some(Duration::from_millis(1)));

        client.set_timeout(Duration::from_secs(24 * 60 * 60)).unwrap();
        assert_eq!(client.get_timeout().unwrap(), Some(Duration::from_secs(86_400)));
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!("quick".parse::<TimeoutPreset>().unwrap(), TimeoutPreset::Quick);
        assert_eq!(" Extended ".parse::<TimeoutPreset>().unwrap(), TimeoutPreset::Extended);
        assert_eq!(TimeoutPreset::Long.to_string(), "long");
        assert!("forever".parse::<TimeoutPreset>().is_err());
    }
}
