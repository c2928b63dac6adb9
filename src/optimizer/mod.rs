//! Content optimization
//!
//! Dispatches a payload to a shrink strategy by content type:
//!
//! | content type | strategy |
//! |---|---|
//! | `text/css`, `text/html`, `text/javascript`, `image/svg+xml` | text minification |
//! | `image/jpeg` | lossy JPEG recompression at the configured quality |
//! | anything else | returned unchanged |
//!
//! Matching is exact on the raw header value unless
//! `optimizer.ignore_mime_parameters` is set.

pub mod error;
pub mod jpeg;
pub mod minify;

use bytes::Bytes;
use std::sync::Arc;

pub use error::OptimizeError;
pub use jpeg::{JpegRecompressor, Recompressor};
pub use minify::{Minifier, StandardMinifier, TextKind};

use crate::config::OptimizerConfig;
use crate::rewrite::media_type_essence;

pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Shrink strategy selected for a content type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Minify(TextKind),
    Recompress,
    Passthrough,
}

/// Content-type dispatcher over a minifier and a recompressor
#[derive(Clone)]
pub struct ContentOptimizer {
    minifier: Arc<dyn Minifier>,
    recompressor: Arc<dyn Recompressor>,
    config: OptimizerConfig,
}

impl ContentOptimizer {
    /// Optimizer with the standard minifier and JPEG recompressor
    pub fn new(config: OptimizerConfig) -> Self {
        Self::with_backends(config, Arc::new(StandardMinifier), Arc::new(JpegRecompressor))
    }

    pub fn with_backends(
        config: OptimizerConfig,
        minifier: Arc<dyn Minifier>,
        recompressor: Arc<dyn Recompressor>,
    ) -> Self {
        Self {
            minifier,
            recompressor,
            config,
        }
    }

    pub fn jpeg_quality(&self) -> u8 {
        self.config.jpeg_quality
    }

    pub fn strategy_for(&self, content_type: &str) -> Strategy {
        if !self.config.enabled {
            return Strategy::Passthrough;
        }

        let essence;
        let key = if self.config.ignore_mime_parameters {
            essence = media_type_essence(content_type);
            essence.as_str()
        } else {
            content_type
        };

        if key == JPEG_CONTENT_TYPE {
            return Strategy::Recompress;
        }
        match TextKind::from_content_type(key) {
            Some(kind) => Strategy::Minify(kind),
            None => Strategy::Passthrough,
        }
    }

    /// Shrink `payload` according to `content_type`
    ///
    /// Unknown content types return the input untouched (same buffer).
    pub fn optimize(&self, content_type: &str, payload: Bytes) -> Result<Bytes, OptimizeError> {
        match self.strategy_for(content_type) {
            Strategy::Passthrough => Ok(payload),
            Strategy::Minify(kind) => self.minifier.minify(kind, &payload).map(Bytes::from),
            Strategy::Recompress => self
                .recompressor
                .recompress(&payload, self.config.jpeg_quality)
                .map(Bytes::from),
        }
    }
}
