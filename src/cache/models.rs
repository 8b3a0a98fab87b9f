//! Verdict cache entry and statistics models.

// Author: kelexine (https://github.com/kelexine)

use crate::models::Verdict;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// A verdict together with the moment it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub verdict: Verdict,
    pub stored_at: Instant,
}

/// Statistics for cache operations.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of lookups answered from the cache.
    pub hits: u64,
    /// Number of lookups that found nothing usable.
    pub misses: u64,
    /// Number of entries dropped because their TTL had passed.
    pub expirations: u64,
    /// Number of verdicts written.
    pub stores: u64,
}

/// Lock-free counters backing [`CacheStats`].
#[derive(Debug, Default)]
pub(crate) struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
    stores: AtomicU64,
}

impl CacheCounters {
    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn expired(&self, count: u64) {
        self.expirations.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn stored(&self) {
        self.stores.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
        }
    }
}
