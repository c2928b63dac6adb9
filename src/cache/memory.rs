//! In-memory response cache
//!
//! `ResponseCache` pairs a moka store with a [`RequestCoalescer`] so that for
//! any fingerprint at most one computation is in flight, and concurrent
//! misses share its outcome instead of starting their own.

use std::future::Future;

use super::entry::CacheEntry;
use super::stats::{CacheStats, CacheStatsTracker};
use super::CacheConfig;
use crate::error::PipelineError;
use crate::fingerprint::Fingerprint;
use crate::request_coalescing::{CoalescingSlot, RequestCoalescer};

/// Result of a successful computation: the entry to store and the status the
/// origin answered with
#[derive(Debug, Clone)]
pub struct Computed {
    pub entry: CacheEntry,
    pub status: u16,
}

/// How a request was answered
#[derive(Debug, Clone)]
pub enum CacheOutcome {
    /// Served from the store
    Hit(CacheEntry),
    /// Produced by a computation, this request's own or a shared one
    Fresh {
        entry: CacheEntry,
        status: u16,
        coalesced: bool,
    },
}

impl CacheOutcome {
    pub fn entry(&self) -> &CacheEntry {
        match self {
            CacheOutcome::Hit(entry) | CacheOutcome::Fresh { entry, .. } => entry,
        }
    }

    pub fn into_entry(self) -> CacheEntry {
        match self {
            CacheOutcome::Hit(entry) | CacheOutcome::Fresh { entry, .. } => entry,
        }
    }

    /// Status served for this outcome; cached responses are always 200
    pub fn status(&self) -> u16 {
        match self {
            CacheOutcome::Hit(_) => 200,
            CacheOutcome::Fresh { status, .. } => *status,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, CacheOutcome::Hit(_))
    }

    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            CacheOutcome::Hit(_) => "hit",
            CacheOutcome::Fresh {
                coalesced: true, ..
            } => "coalesced",
            CacheOutcome::Fresh { .. } => "miss",
        }
    }
}

type SharedOutcome = Result<Computed, PipelineError>;

/// Fingerprint-keyed response store with single-flight population
pub struct ResponseCache {
    store: moka::future::Cache<Fingerprint, CacheEntry>,
    coalescer: RequestCoalescer<SharedOutcome>,
    stats: CacheStatsTracker,
}

impl ResponseCache {
    /// Create a new ResponseCache from configuration
    pub fn new(config: &CacheConfig) -> Self {
        let mut builder = moka::future::Cache::builder();
        if let Some(max_entries) = config.max_entries {
            builder = builder.max_capacity(max_entries);
        }

        Self {
            store: builder.build(),
            coalescer: RequestCoalescer::new(),
            stats: CacheStatsTracker::default(),
        }
    }

    /// Get an entry from the store, counting a hit or a miss
    pub async fn lookup(&self, key: &Fingerprint) -> Option<CacheEntry> {
        match self.store.get(key).await {
            Some(entry) => {
                self.stats.increment_hits();
                Some(entry)
            }
            None => {
                self.stats.increment_misses();
                None
            }
        }
    }

    /// Return the stored entry for `key`, or run `compute` to produce it
    ///
    /// Concurrent callers with the same key while a computation is in flight
    /// wait for it and receive a clone of its outcome, errors included. Only
    /// successful outcomes are stored; after a failure the next caller runs a
    /// new computation. The store is written before the outcome is published,
    /// so a request arriving after completion always finds the entry.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &Fingerprint,
        compute: F,
    ) -> Result<CacheOutcome, PipelineError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SharedOutcome>,
    {
        if let Some(entry) = self.lookup(key).await {
            return Ok(CacheOutcome::Hit(entry));
        }

        loop {
            match self.coalescer.acquire(key) {
                CoalescingSlot::Leader(guard) => {
                    // A previous leader may have stored the entry after our lookup
                    if let Some(entry) = self.store.get(key).await {
                        drop(guard);
                        return Ok(CacheOutcome::Hit(entry));
                    }

                    let outcome = compute().await;
                    if let Ok(computed) = &outcome {
                        self.store
                            .insert(key.clone(), computed.entry.clone())
                            .await;
                    }
                    guard.complete(outcome.clone());

                    return outcome.map(|computed| CacheOutcome::Fresh {
                        entry: computed.entry,
                        status: computed.status,
                        coalesced: false,
                    });
                }
                CoalescingSlot::Follower(follower) => {
                    self.stats.increment_coalesced();
                    match follower.wait().await {
                        Some(outcome) => {
                            return outcome.map(|computed| CacheOutcome::Fresh {
                                entry: computed.entry,
                                status: computed.status,
                                coalesced: true,
                            });
                        }
                        // Leader was cancelled before publishing
                        None => {
                            tracing::debug!(fingerprint = %key, "Coalesced leader went away, retrying");
                            if let Some(entry) = self.store.get(key).await {
                                return Ok(CacheOutcome::Hit(entry));
                            }
                        }
                    }
                }
            }
        }
    }

    /// Number of stored entries (eventually consistent)
    pub fn entry_count(&self) -> u64 {
        self.store.entry_count()
    }

    /// Number of computations currently in flight
    pub fn in_flight_count(&self) -> usize {
        self.coalescer.in_flight_count()
    }

    /// Apply pending store maintenance so counts are exact
    pub async fn run_pending_tasks(&self) {
        self.store.run_pending_tasks().await;
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.store.entry_count())
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}
