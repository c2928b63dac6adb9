//! Special endpoint handlers for the proxy.
//!
//! The only built-in endpoint is the Prometheus metrics export, served at
//! `server.metrics_path` when one is configured. Every other path goes to
//! the pipeline.
//!
//! Functions return `EndpointResponse` instead of writing directly to the
//! session; the caller writes it out.

use crate::metrics::Metrics;

/// Response from a special endpoint handler.
#[derive(Debug, Clone)]
pub struct EndpointResponse {
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value
    pub content_type: &'static str,
    /// Response body
    pub body: String,
}

impl EndpointResponse {
    /// Create a plain text response (for Prometheus metrics).
    pub fn prometheus(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/plain; version=0.0.4",
            body,
        }
    }
}

/// Whether `path` is the configured metrics endpoint
pub fn is_metrics_path(metrics_path: Option<&str>, path: &str) -> bool {
    metrics_path.is_some_and(|configured| configured == path)
}

/// Generate response for the metrics endpoint.
pub fn handle_metrics(metrics: &Metrics) -> EndpointResponse {
    EndpointResponse::prometheus(metrics.export_prometheus())
}
