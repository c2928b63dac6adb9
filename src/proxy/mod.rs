// Proxy module - Pingora ProxyHttp implementation
// Answers every request from the pipeline; nothing is proxied upstream by Pingora

use async_trait::async_trait;
use bytes::Bytes;
use pingora_core::upstreams::peer::HttpPeer;
use pingora_core::Result;
use pingora_http::ResponseHeader;
use pingora_proxy::{ProxyHttp, Session};
use std::sync::Arc;

use crate::compression::{accepts_gzip, encode_response, CompressionConfig, GZIP_ENCODING};
use crate::config::Config;
use crate::error::ProxyError;
use crate::metrics::Metrics;
use crate::pipeline::{Pipeline, PipelineResponse, RequestContext};

pub mod special_endpoints;

use special_endpoints::{handle_metrics, is_metrics_path};

/// ShrinkrayProxy implements the Pingora ProxyHttp trait
/// Serves each request from the fetch -> rewrite -> optimize pipeline
pub struct ShrinkrayProxy {
    pipeline: Arc<Pipeline>,
    metrics: Arc<Metrics>,
    compression: CompressionConfig,
    metrics_path: Option<String>,
}

impl ShrinkrayProxy {
    /// Create a new ShrinkrayProxy from configuration
    pub fn new(config: &Config) -> std::result::Result<Self, ProxyError> {
        let metrics = Arc::new(Metrics::new());
        let pipeline = Pipeline::new(config, Arc::clone(&metrics))?;
        Ok(Self::with_pipeline(config, Arc::new(pipeline)))
    }

    /// Create a proxy around an existing pipeline
    pub fn with_pipeline(config: &Config, pipeline: Arc<Pipeline>) -> Self {
        Self {
            metrics: Arc::clone(pipeline.metrics()),
            pipeline,
            compression: config.compression.clone(),
            metrics_path: config.server.metrics_path.clone(),
        }
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    async fn write_metrics(&self, session: &mut Session) -> Result<()> {
        let response = handle_metrics(&self.metrics);
        let mut header = ResponseHeader::build(response.status, None)?;
        header.insert_header("Content-Type", response.content_type)?;
        header.insert_header("Content-Length", response.body.len().to_string())?;

        session
            .write_response_header(Box::new(header), false)
            .await?;
        session
            .write_response_body(Some(Bytes::from(response.body)), true)
            .await?;
        Ok(())
    }

    async fn write_pipeline_response(
        &self,
        session: &mut Session,
        ctx: &RequestContext,
        response: PipelineResponse,
    ) -> Result<()> {
        let client_accepts_gzip = accepts_gzip(
            session
                .req_header()
                .headers
                .get("accept-encoding")
                .and_then(|v| v.to_str().ok()),
        );

        let encoded = match encode_response(
            response.body.clone(),
            &response.content_type,
            client_accepts_gzip,
            &self.compression,
        ) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    error = %e,
                    "Compression failed, sending identity body"
                );
                crate::compression::EncodedBody {
                    data: response.body,
                    gzipped: false,
                }
            }
        };

        let header = build_response_header(
            response.status,
            &response.content_type,
            encoded.data.len(),
            encoded.gzipped,
        )?;

        if encoded.gzipped {
            self.metrics.increment_gzip_responses();
        }
        self.metrics.add_bytes_sent(encoded.data.len() as u64);

        session
            .write_response_header(Box::new(header), false)
            .await?;
        session.write_response_body(Some(encoded.data), true).await?;
        Ok(())
    }
}

/// Response header for a pipeline response
///
/// `Content-Type` is omitted when the content type is empty.
pub fn build_response_header(
    status: u16,
    content_type: &str,
    content_length: usize,
    gzipped: bool,
) -> Result<ResponseHeader> {
    let mut header = ResponseHeader::build(status, None)?;
    if !content_type.is_empty() {
        header.insert_header("Content-Type", content_type)?;
    }
    header.insert_header("Content-Length", content_length.to_string())?;
    if gzipped {
        header.insert_header("Content-Encoding", GZIP_ENCODING)?;
        header.insert_header("Vary", "Accept-Encoding")?;
    }
    Ok(header)
}

#[async_trait]
impl ProxyHttp for ShrinkrayProxy {
    type CTX = RequestContext;

    /// Create a new request context for each incoming request
    fn new_ctx(&self) -> Self::CTX {
        RequestContext::default()
    }

    /// Never reached: request_filter answers every request
    async fn upstream_peer(
        &self,
        _session: &mut Session,
        _ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        Err(pingora_core::Error::explain(
            pingora_core::ErrorType::InternalError,
            "Responses are produced by the pipeline, there is no upstream peer",
        ))
    }

    async fn request_filter(&self, session: &mut Session, ctx: &mut Self::CTX) -> Result<bool> {
        let req = session.req_header();
        let path = req.uri.path().to_string();
        let path_and_query = req
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| path.clone());
        *ctx = RequestContext::new(req.method.to_string(), path_and_query);

        tracing::debug!(
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = %ctx.path_and_query(),
            "Received request"
        );

        if is_metrics_path(self.metrics_path.as_deref(), &path) {
            self.write_metrics(session).await?;
            return Ok(true);
        }

        let response = self.pipeline.handle(ctx).await;
        self.write_pipeline_response(session, ctx, response).await?;

        Ok(true)
    }

    async fn logging(
        &self,
        session: &mut Session,
        e: Option<&pingora_core::Error>,
        ctx: &mut Self::CTX,
    ) {
        if let Some(e) = e {
            let status_code = session
                .response_written()
                .map(|resp| resp.status.as_u16())
                .unwrap_or(0);
            tracing::warn!(
                request_id = %ctx.request_id(),
                path = %ctx.path_and_query(),
                status = status_code,
                error = %e,
                "Failed to write response to client"
            );
        }
    }
}
