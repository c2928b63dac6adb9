/// Compression error types
use std::fmt;

/// Errors that can occur while encoding a response body
#[derive(Debug, Clone)]
pub enum CompressionError {
    /// Encoder failed to write or finish the stream
    CompressionFailed(String),
}

impl fmt::Display for CompressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionError::CompressionFailed(msg) => {
                write!(f, "Compression failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for CompressionError {}
