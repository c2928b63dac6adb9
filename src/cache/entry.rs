//! Cached response type

use bytes::Bytes;

/// A transformed response body with the origin's Content-Type
///
/// The body is shared: clones handed to concurrent readers point at the same
/// buffer, so stored entries are never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Rewritten and optimized payload
    pub data: Bytes,
    /// Content-Type as received from the origin, "" when absent
    pub content_type: String,
}

impl CacheEntry {
    pub fn new(data: Bytes, content_type: impl Into<String>) -> Self {
        Self {
            data,
            content_type: content_type.into(),
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}
