//! HTTP client utilities for making requests to the Ollama API.
//!
//! The request timeout takes effect here: every request builds its
//! `reqwest::Client` from the current transport options, so a timeout changed
//! between two requests applies to the second one.

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use tracing::warn;

use crate::options::{HttpTransport, TransportOptions};

/// Build a configured HTTP client from transport options.
///
/// This applies common configuration like timeouts and proxies.
///
/// # Example
/// ```ignore
/// let client = build_http_client(&transport_options)?;
/// ```
pub fn build_http_client(
    transport_options: &TransportOptions<HttpTransport>,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder();

    if let Some(timeout) = transport_options.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(proxy_url) = &transport_options.provider.proxy {
        match reqwest::Proxy::all(proxy_url) {
            Ok(proxy) => builder = builder.proxy(proxy),
            Err(e) => warn!("ignoring invalid proxy {}: {}", proxy_url, e),
        }
    }

    builder.build()
}

/// Add the bearer token and any extra headers from the transport options.
pub fn apply_transport_headers(
    mut request: RequestBuilder,
    transport: &HttpTransport,
) -> RequestBuilder {
    if let Some(api_key) = &transport.api_key {
        request = request.header(AUTHORIZATION, format!("Bearer {}", api_key.expose_secret()));
    }
    if let Some(headers) = &transport.extra_headers {
        for (key, value) in headers {
            request = request.header(key, value);
        }
    }
    request
}
