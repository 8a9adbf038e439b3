//! HTTP client wrapper used by download tasks.
//!
//! This module provides the [`HttpClient`] struct which issues the GET (and
//! ranged GET) requests a task needs, with timeouts, environment-declared
//! proxies, and status validation applied in one place.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, HeaderMap, RANGE};
use reqwest::{Client, ClientBuilder, NoProxy, Proxy};
use tracing::{debug, instrument};

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::user_agent;

/// Timeouts applied to every request made by an [`HttpClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    /// Time allowed to establish a connection.
    pub connect_timeout: Duration,
    /// Time allowed between two successful reads of a response body.
    pub read_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
        }
    }
}

/// HTTP client for download tasks.
///
/// Cheap to clone; clones share the underlying connection pool, so one client
/// can back every task in a run.
///
/// # Example
///
/// ```no_run
/// use std::collections::HashMap;
/// use rget_core::download::HttpClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let response = client
///     .fetch("https://example.com/file.iso", &HashMap::new(), None)
///     .await?;
/// println!("status: {}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a client with default timeouts (30s connect, 5min read).
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static configuration.
    /// This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_settings(HttpSettings::default())
            .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a client with explicit timeouts.
    ///
    /// # Errors
    ///
    /// Returns the builder error if the TLS backend cannot be initialised or a
    /// proxy URL from the environment is malformed.
    pub fn with_settings(settings: HttpSettings) -> Result<Self, reqwest::Error> {
        let client = base_client_builder(settings).build()?;
        Ok(Self { client })
    }

    /// Sends a GET request and validates the status.
    ///
    /// All `headers` are applied verbatim. When `range_start` is set, a
    /// `Range: bytes=<start>-` header is added, replacing any caller-supplied
    /// `Range`.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::Transport`] when the request cannot be sent (this
    ///   includes invalid header names or values)
    /// - [`DownloadError::HttpStatus`] for any status other than 200 and 206
    #[instrument(level = "debug", skip(self, headers), fields(url = %url))]
    pub async fn fetch(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        range_start: Option<u64>,
    ) -> Result<reqwest::Response, DownloadError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            if range_start.is_some() && name.eq_ignore_ascii_case(RANGE.as_str()) {
                continue;
            }
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(start) = range_start {
            request = request.header(RANGE, format!("bytes={start}-"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| DownloadError::transport(url, e))?;

        let status = response.status().as_u16();
        if !matches!(status, 200 | 206) {
            return Err(DownloadError::http_status(url, status));
        }

        debug!(
            status,
            content_length = ?declared_content_length(response.headers()),
            "response accepted"
        );
        Ok(response)
    }
}

/// Returns true when the response advertises byte-range support.
///
/// Either `Accept-Ranges: bytes` or any non-empty `Content-Range` counts.
#[must_use]
pub fn supports_byte_ranges(headers: &HeaderMap) -> bool {
    let accepts_bytes = headers
        .get(ACCEPT_RANGES)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("bytes"));
    let has_content_range = headers
        .get(CONTENT_RANGE)
        .is_some_and(|v| !v.as_bytes().is_empty());
    accepts_bytes || has_content_range
}

/// Content length declared by the response headers, if any.
#[must_use]
pub fn declared_content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

fn base_client_builder(settings: HttpSettings) -> ClientBuilder {
    // Proxies come from the environment only, never from platform settings.
    apply_env_proxies(Client::builder().no_proxy())
        .connect_timeout(settings.connect_timeout)
        .read_timeout(settings.read_timeout)
        .user_agent(user_agent::default_user_agent())
}

fn apply_env_proxies(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved.no_proxy(NoProxy::from_env()));
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved.no_proxy(NoProxy::from_env()));
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    proxy_for_scheme(scheme, |name| std::env::var(name).ok())
}

fn proxy_for_scheme(scheme: &str, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    let names: &[&str] = match scheme {
        "https" => &["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"],
        "http" => &["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"],
        _ => return None,
    };
    names.iter().find_map(|name| {
        lookup(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
