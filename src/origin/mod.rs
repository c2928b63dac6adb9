//! Origin fetcher
//!
//! Issues a single GET to the destination URL and hands back the raw body,
//! the declared `Content-Type` and the status code. Non-2xx statuses are
//! content like any other; only transport failures become [`FetchError`].

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::time::Duration;

use crate::config::OriginConfig;

/// Maximum redirect hops when redirect following is enabled
pub const MAX_REDIRECTS: usize = 10;

/// Raw response from the origin
#[derive(Debug, Clone)]
pub struct OriginResponse {
    pub body: Bytes,
    /// Raw `Content-Type` header value, empty when the origin sent none
    pub content_type: String,
    pub status: u16,
}

/// Transport-level failure talking to the origin
#[derive(Debug, Clone)]
pub enum FetchError {
    /// The destination URL could not be turned into a request
    InvalidUrl { url: String, message: String },
    /// DNS, connect or TLS failure
    Connect { url: String, message: String },
    /// No response within the configured timeout
    Timeout { url: String },
    /// Response started but the body could not be read
    Body { url: String, message: String },
    /// Anything else the client reports (redirect loops, protocol errors)
    Request { url: String, message: String },
}

impl FetchError {
    /// Destination URL the failure occurred on
    pub fn url(&self) -> &str {
        match self {
            FetchError::InvalidUrl { url, .. }
            | FetchError::Connect { url, .. }
            | FetchError::Timeout { url }
            | FetchError::Body { url, .. }
            | FetchError::Request { url, .. } => url,
        }
    }

    /// Short label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::InvalidUrl { .. } => "invalid_url",
            FetchError::Connect { .. } => "connect",
            FetchError::Timeout { .. } => "timeout",
            FetchError::Body { .. } => "body",
            FetchError::Request { .. } => "request",
        }
    }

    fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        let url = url.to_string();
        let message = err.to_string();
        if err.is_timeout() {
            FetchError::Timeout { url }
        } else if err.is_builder() {
            FetchError::InvalidUrl { url, message }
        } else if err.is_connect() {
            FetchError::Connect { url, message }
        } else if err.is_body() || err.is_decode() {
            FetchError::Body { url, message }
        } else {
            FetchError::Request { url, message }
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::InvalidUrl { url, message } => {
                write!(f, "invalid destination URL {}: {}", url, message)
            }
            FetchError::Connect { url, message } => {
                write!(f, "cannot connect to {}: {}", url, message)
            }
            FetchError::Timeout { url } => write!(f, "timed out fetching {}", url),
            FetchError::Body { url, message } => {
                write!(f, "failed to read body from {}: {}", url, message)
            }
            FetchError::Request { url, message } => {
                write!(f, "request to {} failed: {}", url, message)
            }
        }
    }
}

impl std::error::Error for FetchError {}

/// Source of raw origin content
#[async_trait]
pub trait OriginFetcher: Send + Sync {
    async fn fetch(&self, destination_url: &str) -> Result<OriginResponse, FetchError>;
}

/// [`OriginFetcher`] backed by a pooled reqwest client
#[derive(Clone)]
pub struct HttpOriginFetcher {
    client: reqwest::Client,
}

impl HttpOriginFetcher {
    /// Build a fetcher with the configured timeout and redirect policy
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Request` if the HTTP client cannot be created
    /// (e.g., TLS backend initialization failure).
    pub fn new(config: &OriginConfig) -> Result<Self, FetchError> {
        let redirect = if config.follow_redirects {
            reqwest::redirect::Policy::limited(MAX_REDIRECTS)
        } else {
            reqwest::redirect::Policy::none()
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .redirect(redirect)
            .build()
            .map_err(|e| FetchError::Request {
                url: format!("{}://{}", config.scheme, config.host),
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl OriginFetcher for HttpOriginFetcher {
    async fn fetch(&self, destination_url: &str) -> Result<OriginResponse, FetchError> {
        let response = self
            .client
            .get(destination_url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(destination_url, e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = response.bytes().await.map_err(|e| FetchError::Body {
            url: destination_url.to_string(),
            message: e.to_string(),
        })?;

        tracing::debug!(
            destination_url = %destination_url,
            status = status,
            content_type = %content_type,
            bytes = body.len(),
            "Fetched origin response"
        );

        Ok(OriginResponse {
            body,
            content_type,
            status,
        })
    }
}
