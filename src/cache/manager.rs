// Cache manager - TTL verdict cache keyed by content fingerprint
// Author: kelexine (https://github.com/kelexine)

use crate::cache::models::{CacheCounters, CacheEntry, CacheStats};
use crate::config::CacheConfig;
use crate::metrics;
use crate::models::Verdict;
use crate::utils::clock::SharedClock;
use dashmap::DashMap;
use std::time::Instant;
use tracing::debug;

/// Entries inspected when a full cache must evict
const EVICTION_SAMPLE: usize = 64;

/// Verdict cache with lazy expiry.
///
/// An entry is valid while `now - stored_at < ttl`. Expired entries are
/// removed when a lookup touches them or when `sweep` runs; there is no
/// per-entry timer. A write at capacity evicts a single entry, picked as the
/// oldest of a bounded sample, which is exact for caches up to that size.
#[derive(Debug)]
pub struct ResultCache {
    config: CacheConfig,
    entries: DashMap<String, CacheEntry>,
    counters: CacheCounters,
    clock: SharedClock,
}

impl ResultCache {
    /// Create a new result cache
    pub fn new(config: CacheConfig, clock: SharedClock) -> Self {
        Self {
            config,
            entries: DashMap::new(),
            counters: CacheCounters::default(),
            clock,
        }
    }

    fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at) < self.config.ttl()
    }

    /// Look up a verdict, evicting the entry if it has expired
    pub fn get(&self, key: &str) -> Option<Verdict> {
        let now = self.clock.now();

        if let Some(entry) = self.entries.get(key) {
            let age = now.saturating_duration_since(entry.stored_at);
            if self.is_fresh(&entry, now) {
                debug!(
                    "Cache hit - valid entry found (age: {:.2}s, ttl: {}s)",
                    age.as_secs_f64(),
                    self.config.ttl_seconds
                );
                self.counters.hit();
                metrics::record_cache_operation("hit");
                return Some(entry.verdict.clone());
            }
            debug!(
                "Cache miss - entry expired (age: {:.2}s, ttl: {}s)",
                age.as_secs_f64(),
                self.config.ttl_seconds
            );
        } else {
            debug!("Cache miss - key not found (total entries: {})", self.entries.len());
            self.counters.miss();
            metrics::record_cache_operation("miss");
            return None;
        }

        // Re-checked under the shard lock so a concurrent fresh write survives
        if self
            .entries
            .remove_if(key, |_, entry| !self.is_fresh(entry, now))
            .is_some()
        {
            self.counters.expired(1);
            metrics::record_cache_operation("expired");
            metrics::update_cache_entries(self.entries.len());
        }
        self.counters.miss();
        metrics::record_cache_operation("miss");
        None
    }

    /// Store a verdict, overwriting any previous entry for `key`
    pub fn put(&self, key: &str, verdict: Verdict) {
        let now = self.clock.now();

        if !self.entries.contains_key(key) && self.entries.len() >= self.config.max_entries {
            self.make_room(now);
        }

        self.entries.insert(
            key.to_string(),
            CacheEntry {
                verdict,
                stored_at: now,
            },
        );
        self.counters.stored();
        metrics::record_cache_operation("store");
        metrics::update_cache_entries(self.entries.len());
    }

    /// Number of stored entries, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all cached entries, returning how many were held
    pub fn clear(&self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        metrics::update_cache_entries(0);
        debug!("Cache cleared ({} entries)", removed);
        removed
    }

    /// Remove every expired entry. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| self.is_fresh(entry, now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            self.counters.expired(removed as u64);
            metrics::update_cache_entries(self.entries.len());
        }
        removed
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    /// Evict one entry: the oldest among the first `EVICTION_SAMPLE` visited.
    ///
    /// Only read locks are taken while scanning. Expired entries are always
    /// older than fresh ones, so an expired entry in the sample goes first;
    /// the rest are left to lazy expiry and `sweep`.
    fn make_room(&self, now: Instant) {
        let oldest = self
            .entries
            .iter()
            .take(EVICTION_SAMPLE)
            .min_by_key(|entry| entry.value().stored_at)
            .map(|entry| (entry.key().clone(), self.is_fresh(entry.value(), now)));

        let Some((key, fresh)) = oldest else {
            return;
        };
        if self.entries.remove(&key).is_some() {
            if fresh {
                debug!("Cache at capacity, evicting oldest entry {}", &key[..key.len().min(16)]);
            } else {
                self.counters.expired(1);
            }
        }
    }
}
