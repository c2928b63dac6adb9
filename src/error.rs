// Error types module

use std::fmt;

use crate::optimizer::OptimizeError;
use crate::origin::FetchError;

/// Centralized error type for proxy startup and wiring
///
/// Request-level failures never surface as `ProxyError`; they are mapped to
/// status codes by the pipeline (see [`PipelineError`]).
#[derive(Debug, Clone)]
pub enum ProxyError {
    /// Configuration errors (invalid YAML, missing env vars, bad values)
    Config(String),

    /// Internal proxy errors (client construction, server bootstrap)
    Internal(String),
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyError::Config(msg) => write!(f, "Configuration error: {}", msg),
            ProxyError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ProxyError {}

impl From<crate::config::ConfigError> for ProxyError {
    fn from(err: crate::config::ConfigError) -> Self {
        ProxyError::Config(err.to_string())
    }
}

/// Terminal failure of one pipeline run
///
/// Cloneable so that every request coalesced onto a failed run receives an
/// equivalent error.
#[derive(Debug, Clone)]
pub enum PipelineError {
    /// Origin could not be reached or its body could not be read
    Fetch(FetchError),

    /// Minifier or recompressor rejected the payload
    Optimize(OptimizeError),
}

impl PipelineError {
    /// HTTP status code served to the client for this failure
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineError::Fetch(_) => 404,
            PipelineError::Optimize(_) => 500,
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Fetch(err) => write!(f, "Origin fetch failed: {}", err),
            PipelineError::Optimize(err) => write!(f, "Optimization failed: {}", err),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Fetch(err) => Some(err),
            PipelineError::Optimize(err) => Some(err),
        }
    }
}

impl From<FetchError> for PipelineError {
    fn from(err: FetchError) -> Self {
        PipelineError::Fetch(err)
    }
}

impl From<OptimizeError> for PipelineError {
    fn from(err: OptimizeError) -> Self {
        PipelineError::Optimize(err)
    }
}
