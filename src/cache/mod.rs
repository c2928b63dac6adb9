// Cache module
//
// Fingerprint-keyed store of transformed responses with request coalescing.
// Entries never expire and are never revalidated; the optional `max_entries`
// bound is the only eviction.

use serde::{Deserialize, Serialize};

pub mod entry;
pub mod memory;
pub mod stats;

pub use entry::CacheEntry;
pub use memory::{CacheOutcome, Computed, ResponseCache};
pub use stats::CacheStats;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheConfig {
    /// Upper bound on stored entries, unbounded when absent
    #[serde(default)]
    pub max_entries: Option<u64>,
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_entries == Some(0) {
            return Err("cache.max_entries must be greater than 0 when set".to_string());
        }
        Ok(())
    }
}
