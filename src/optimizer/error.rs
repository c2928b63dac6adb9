//! Optimizer error types
//!
//! Any variant fails the whole request with a 500; the unoptimized payload is
//! never served or cached as a fallback.

use std::fmt;

#[derive(Debug, Clone)]
pub enum OptimizeError {
    /// Text minifier rejected the payload
    Minify {
        content_type: String,
        message: String,
    },
    /// Text payload was not valid UTF-8
    InvalidUtf8 { content_type: String },
    /// Image could not be decoded
    DecodeFailed { message: String },
    /// Image could not be re-encoded
    EncodeFailed { message: String },
    /// Optimizer panicked or its worker task was lost
    Panicked { content_type: String },
}

impl OptimizeError {
    pub fn minify(content_type: &str, message: impl Into<String>) -> Self {
        OptimizeError::Minify {
            content_type: content_type.to_string(),
            message: message.into(),
        }
    }

    /// Short label for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            OptimizeError::Minify { .. } => "minify",
            OptimizeError::InvalidUtf8 { .. } => "invalid_utf8",
            OptimizeError::DecodeFailed { .. } => "decode",
            OptimizeError::EncodeFailed { .. } => "encode",
            OptimizeError::Panicked { .. } => "panic",
        }
    }
}

impl fmt::Display for OptimizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizeError::Minify {
                content_type,
                message,
            } => write!(f, "Failed to minify {}: {}", content_type, message),
            OptimizeError::InvalidUtf8 { content_type } => {
                write!(f, "Payload declared as {} is not valid UTF-8", content_type)
            }
            OptimizeError::DecodeFailed { message } => {
                write!(f, "Failed to decode image: {}", message)
            }
            OptimizeError::EncodeFailed { message } => {
                write!(f, "Failed to encode to jpeg: {}", message)
            }
            OptimizeError::Panicked { content_type } => {
                write!(f, "Optimizer aborted while processing {}", content_type)
            }
        }
    }
}

impl std::error::Error for OptimizeError {}
