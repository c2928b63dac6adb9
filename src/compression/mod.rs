//! Transport compression
//!
//! gzip applied to the response after the pipeline has produced it:
//! - Accept-Encoding negotiation with q-values
//! - Size threshold and already-compressed content types are skipped
//!
//! Cached entries are always stored uncompressed.

pub mod compress;
pub mod config;
pub mod error;
pub mod negotiation;

pub use compress::{compress_gzip, encode_response, is_precompressed_content_type, EncodedBody};
pub use config::CompressionConfig;
pub use error::CompressionError;
pub use negotiation::{accepts_gzip, GZIP_ENCODING};
