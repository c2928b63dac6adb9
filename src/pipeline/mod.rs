// Request pipeline module - fingerprint, cache, fetch, rewrite, optimize
//
// Every inbound request maps to one destination URL on the origin. The
// transformed response is cached under the URL's fingerprint; concurrent
// misses for the same fingerprint share a single computation.

use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use uuid::Uuid;

use crate::cache::{CacheOutcome, Computed, ResponseCache};
use crate::config::{Config, RewriteScope};
use crate::error::{PipelineError, ProxyError};
use crate::fingerprint::{destination_url, fingerprint};
use crate::metrics::Metrics;
use crate::optimizer::{ContentOptimizer, OptimizeError, Strategy};
use crate::origin::{HttpOriginFetcher, OriginFetcher};
use crate::rewrite::{should_rewrite, LiteralRewriter, Rewriter};

/// Request context that holds the information the pipeline needs about an
/// inbound HTTP request
///
/// The `Default` value is an empty placeholder filled in once the request
/// header has been read.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    request_id: String,
    method: String,
    path_and_query: String,
    timestamp: u64,
}

impl RequestContext {
    /// Create a new RequestContext
    /// Generates a unique request ID (UUID v4) and captures the current timestamp
    pub fn new(method: impl Into<String>, path_and_query: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            method: method.into(),
            path_and_query: path_and_query.into(),
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    /// Get the unique request ID
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Get the HTTP method
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Get the raw path and query string
    pub fn path_and_query(&self) -> &str {
        &self.path_and_query
    }

    /// Get the request timestamp (Unix epoch seconds)
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }
}

/// What the pipeline serves for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResponse {
    pub status: u16,
    /// Empty when no Content-Type header should be sent
    pub content_type: String,
    pub body: Bytes,
    /// `hit`, `miss`, `coalesced` or `error`
    pub cache_status: &'static str,
}

impl PipelineResponse {
    fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: String::new(),
            body: Bytes::new(),
            cache_status: "error",
        }
    }

    fn from_outcome(outcome: CacheOutcome) -> Self {
        let cache_status = outcome.label();
        let status = outcome.status();
        let entry = outcome.into_entry();

        Self {
            status,
            content_type: entry.content_type,
            body: entry.data,
            cache_status,
        }
    }
}

/// The request orchestrator
pub struct Pipeline {
    origin_scheme: String,
    origin_host: String,
    rewrite_scope: RewriteScope,
    fetcher: Arc<dyn OriginFetcher>,
    rewriter: Arc<dyn Rewriter>,
    optimizer: ContentOptimizer,
    cache: ResponseCache,
    metrics: Arc<Metrics>,
}

impl Pipeline {
    /// Build the production pipeline: reqwest origin, literal rewriter,
    /// standard optimizer and an in-memory cache
    pub fn new(config: &Config, metrics: Arc<Metrics>) -> Result<Self, ProxyError> {
        let fetcher = HttpOriginFetcher::new(&config.origin)
            .map_err(|e| ProxyError::Internal(e.to_string()))?;

        Ok(Self::with_components(
            config,
            Arc::new(fetcher),
            Arc::new(LiteralRewriter::from_config(config)),
            ContentOptimizer::new(config.optimizer.clone()),
            metrics,
        ))
    }

    /// Build a pipeline around caller-supplied components
    pub fn with_components(
        config: &Config,
        fetcher: Arc<dyn OriginFetcher>,
        rewriter: Arc<dyn Rewriter>,
        optimizer: ContentOptimizer,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            origin_scheme: config.origin.scheme.clone(),
            origin_host: config.origin.host.clone(),
            rewrite_scope: config.rewrite.scope,
            fetcher,
            rewriter,
            optimizer,
            cache: ResponseCache::new(&config.cache),
            metrics,
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Origin URL a client path maps to
    pub fn destination_url(&self, path_and_query: &str) -> String {
        destination_url(&self.origin_scheme, &self.origin_host, path_and_query)
    }

    /// Serve one request, mapping failures to bare status codes
    pub async fn handle(&self, ctx: &RequestContext) -> PipelineResponse {
        let start = Instant::now();
        self.metrics.increment_request_count();
        self.metrics.increment_method_count(ctx.method());

        let response = match self.process(ctx.path_and_query()).await {
            Ok(outcome) => {
                match &outcome {
                    CacheOutcome::Hit(_) => self.metrics.increment_cache_hit(),
                    CacheOutcome::Fresh {
                        coalesced: true, ..
                    } => self.metrics.increment_cache_coalesced(),
                    CacheOutcome::Fresh { .. } => self.metrics.increment_cache_miss(),
                }
                PipelineResponse::from_outcome(outcome)
            }
            Err(e) => PipelineResponse::empty(e.status_code()),
        };

        self.metrics.increment_status_count(response.status);
        self.metrics.set_cache_entries(self.cache.entry_count());
        self.metrics
            .record_duration(start.elapsed().as_secs_f64() * 1000.0);

        tracing::info!(
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = %ctx.path_and_query(),
            status = response.status,
            cache = response.cache_status,
            bytes = response.body.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Request served"
        );

        response
    }

    /// Resolve a path to a cached or freshly computed response
    pub async fn process(&self, path_and_query: &str) -> Result<CacheOutcome, PipelineError> {
        let url = self.destination_url(path_and_query);
        let key = fingerprint(&url);

        self.cache
            .get_or_compute(&key, || self.compute(&url))
            .await
    }

    /// Fetch, rewrite and optimize one destination URL
    async fn compute(&self, url: &str) -> Result<Computed, PipelineError> {
        self.metrics.increment_origin_fetch();
        let response = match self.fetcher.fetch(url).await {
            Ok(response) => response,
            Err(e) => {
                self.metrics.increment_fetch_error(e.kind());
                tracing::warn!(
                    destination_url = %url,
                    kind = e.kind(),
                    error = %e,
                    "Origin fetch failed"
                );
                return Err(PipelineError::Fetch(e));
            }
        };

        let content_type = response.content_type;
        let body = if should_rewrite(self.rewrite_scope, &content_type) {
            Bytes::from(self.rewriter.rewrite(&response.body))
        } else {
            response.body
        };

        let optimized = match self.optimize(&content_type, body).await {
            Ok(optimized) => optimized,
            Err(e) => {
                self.metrics.increment_optimize_error(e.kind());
                tracing::error!(
                    destination_url = %url,
                    content_type = %content_type,
                    kind = e.kind(),
                    error = %e,
                    "Optimization failed"
                );
                return Err(PipelineError::Optimize(e));
            }
        };

        Ok(Computed {
            entry: crate::cache::CacheEntry::new(optimized, content_type),
            status: response.status,
        })
    }

    /// Run the optimizer off the async worker threads
    async fn optimize(&self, content_type: &str, body: Bytes) -> Result<Bytes, OptimizeError> {
        if self.optimizer.strategy_for(content_type) == Strategy::Passthrough {
            return Ok(body);
        }

        let bytes_in = body.len() as u64;
        let optimizer = self.optimizer.clone();
        let owned_type = content_type.to_string();
        let optimized = tokio::task::spawn_blocking(move || optimizer.optimize(&owned_type, body))
            .await
            .unwrap_or_else(|_| {
                Err(OptimizeError::Panicked {
                    content_type: content_type.to_string(),
                })
            })?;

        self.metrics
            .record_optimized_bytes(bytes_in, optimized.len() as u64);
        Ok(optimized)
    }
}
