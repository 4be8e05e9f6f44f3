//! Counter-backed metrics sink with point-in-time snapshots.
//!
//! [`AtomicMetrics`] is the bridge between the push-style [`Metrics`] sink
//! and pull-style consumers: tests assert on its snapshots, and exporters
//! can scrape them. Counters are cache-line padded; signals arrive from
//! every shard on hot paths.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::ds::padding::CachePadded;
use crate::metrics::traits::Metrics;
use crate::options::EvictReason;

/// Point-in-time view of an [`AtomicMetrics`] sink.
///
/// `entries`/`cost` are gauges holding the most recent per-shard `size`
/// observation; with a single shard they reflect the whole cache.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub evictions_policy: u64,
    pub evictions_ttl: u64,
    pub evictions_capacity: u64,
    pub entries: u64,
    pub cost: u64,
}

impl CacheMetricsSnapshot {
    /// Total evictions across all reasons.
    pub fn evictions(&self) -> u64 {
        self.evictions_policy + self.evictions_ttl + self.evictions_capacity
    }
}

/// `Metrics` sink backed by padded atomic counters.
#[derive(Debug, Default)]
pub struct AtomicMetrics {
    hits: CachePadded<AtomicU64>,
    misses: CachePadded<AtomicU64>,
    evictions_policy: CachePadded<AtomicU64>,
    evictions_ttl: CachePadded<AtomicU64>,
    evictions_capacity: CachePadded<AtomicU64>,
    entries: AtomicU64,
    cost: AtomicU64,
}

impl AtomicMetrics {
    /// Creates a sink with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the current counter values.
    pub fn snapshot(&self) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions_policy: self.evictions_policy.load(Ordering::Relaxed),
            evictions_ttl: self.evictions_ttl.load(Ordering::Relaxed),
            evictions_capacity: self.evictions_capacity.load(Ordering::Relaxed),
            entries: self.entries.load(Ordering::Relaxed),
            cost: self.cost.load(Ordering::Relaxed),
        }
    }

    /// Resets every counter to zero (between test cases or bench
    /// iterations).
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions_policy.store(0, Ordering::Relaxed);
        self.evictions_ttl.store(0, Ordering::Relaxed);
        self.evictions_capacity.store(0, Ordering::Relaxed);
        self.entries.store(0, Ordering::Relaxed);
        self.cost.store(0, Ordering::Relaxed);
    }
}

impl Metrics for AtomicMetrics {
    fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn evict(&self, reason: EvictReason) {
        let counter = match reason {
            EvictReason::Policy => &self.evictions_policy,
            EvictReason::Ttl => &self.evictions_ttl,
            EvictReason::Capacity => &self.evictions_capacity,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn size(&self, entries: usize, cost: u64) {
        self.entries.store(entries as u64, Ordering::Relaxed);
        self.cost.store(cost, Ordering::Relaxed);
    }
}
