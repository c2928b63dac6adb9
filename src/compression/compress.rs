//! gzip response encoding
use std::io::Write;

use bytes::Bytes;

use super::config::CompressionConfig;
use super::error::CompressionError;

/// Content types whose payload is already entropy-coded
const PRECOMPRESSED_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Response body as it goes on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub data: Bytes,
    pub gzipped: bool,
}

/// Compress data using gzip
pub fn compress_gzip(data: &[u8], level: u32) -> Result<Vec<u8>, CompressionError> {
    let mut encoder =
        flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::new(level.min(9)));
    encoder
        .write_all(data)
        .map_err(|e| CompressionError::CompressionFailed(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| CompressionError::CompressionFailed(e.to_string()))
}

pub fn is_precompressed_content_type(content_type: &str) -> bool {
    let essence = crate::rewrite::media_type_essence(content_type);
    PRECOMPRESSED_TYPES.contains(&essence.as_str())
}

/// Encode a response body for a client
///
/// Returns the body unchanged unless compression is enabled, the client
/// accepts gzip, the body reaches `min_size_bytes` and the content type is
/// not already compressed.
pub fn encode_response(
    body: Bytes,
    content_type: &str,
    client_accepts_gzip: bool,
    config: &CompressionConfig,
) -> Result<EncodedBody, CompressionError> {
    let eligible = config.enabled
        && client_accepts_gzip
        && !body.is_empty()
        && body.len() >= config.min_size_bytes
        && !is_precompressed_content_type(content_type);

    if !eligible {
        return Ok(EncodedBody {
            data: body,
            gzipped: false,
        });
    }

    let compressed = compress_gzip(&body, config.level)?;
    Ok(EncodedBody {
        data: Bytes::from(compressed),
        gzipped: true,
    })
}
