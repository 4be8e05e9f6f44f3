//! The sharded cache façade.
//!
//! A [`Cache`] splits its keyspace across a power-of-two number of
//! independent shards; a key's 64-bit digest masked by the shard count
//! picks the shard, and everything else happens under that shard's lock.
//! This module owns configuration defaults, TTL deadline and cost
//! computation, the closed flag, and the composition of `get_or_load`
//! from the shard `get`/`set` paths and the singleflight group.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::context::Context;
use crate::ds::bits::next_pow2;
use crate::ds::hash::{reasonable_shard_count, CacheKey, ShardSelector};
use crate::error::{ConfigError, LoadError};
use crate::metrics::NoopMetrics;
use crate::options::{Clock, CostFn, LoaderFn, Options, SystemClock};
use crate::policy::{Lru, Policy};
use crate::shard::Shard;
use crate::singleflight::Group;

/// Aggregated counters across all shards, captured at a point in time.
///
/// The pull-side counterpart of the push-style
/// [`Metrics`](crate::metrics::Metrics) sink.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Resident entries.
    pub entries: usize,
    /// Sum of resident entry costs.
    pub cost: u64,
    pub hits: u64,
    pub misses: u64,
    /// Internally-driven removals only; explicit removes are not counted.
    pub evictions: u64,
}

/// Sharded, in-memory key/value cache.
///
/// All methods are safe for concurrent use; typical complexity is
/// amortized O(1): a map lookup plus constant-time chain adjustments
/// under one shard's lock.
///
/// # Example
///
/// ```
/// use shardcache::cache::Cache;
/// use shardcache::options::Options;
///
/// let cache: Cache<String, u64> = Cache::new(Options::new(10_000)).unwrap();
/// cache.set("a".to_string(), 1);
/// assert_eq!(cache.get(&"a".to_string()), Some(1));
/// cache.remove(&"a".to_string());
/// assert_eq!(cache.len(), 0);
/// ```
pub struct Cache<K, V> {
    shards: Vec<Shard<K, V>>,
    selector: ShardSelector,
    closed: AtomicBool,
    default_ttl: Option<Duration>,
    cost_fn: Option<CostFn<V>>,
    loader: Option<LoaderFn<K, V>>,
    clock: Arc<dyn Clock>,
    flights: Group<K, V>,
}

impl<K, V> std::fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").finish_non_exhaustive()
    }
}

impl<K, V> Cache<K, V>
where
    K: CacheKey,
    V: Clone + Send + Sync + 'static,
{
    /// Constructs a cache from `options`.
    ///
    /// Defaults: no metrics sink → a no-op sink; no policy → LRU;
    /// `shards == 0` → an automatic power-of-two count derived from
    /// available parallelism (explicit values are rounded up to a power
    /// of two). Per-shard capacity and cost limits are ceiling splits of
    /// the global ones.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `capacity` is zero.
    pub fn new(options: Options<K, V>) -> Result<Self, ConfigError> {
        if options.capacity == 0 {
            return Err(ConfigError::new("capacity must be > 0"));
        }

        let metrics = options
            .metrics
            .unwrap_or_else(|| Arc::new(NoopMetrics));
        let policy: Arc<dyn Policy<K>> = options.policy.unwrap_or_else(|| Arc::new(Lru));
        let clock: Arc<dyn Clock> = options.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let requested = if options.shards == 0 {
            reasonable_shard_count()
        } else {
            next_pow2(options.shards as u64) as usize
        };
        let selector = ShardSelector::new(requested);
        let shard_count = selector.shard_count();

        let per_shard_cap = options.capacity.div_ceil(shard_count);
        let per_shard_max_cost = if options.max_cost > 0 {
            options.max_cost.div_ceil(shard_count as u64)
        } else {
            0
        };

        let shards = (0..shard_count)
            .map(|_| {
                Shard::new(
                    per_shard_cap,
                    per_shard_max_cost,
                    policy.build(),
                    Arc::clone(&metrics),
                    options.on_evict.clone(),
                    Arc::clone(&clock),
                )
            })
            .collect();

        Ok(Self {
            shards,
            selector,
            closed: AtomicBool::new(false),
            default_ttl: options.default_ttl,
            cost_fn: options.cost,
            loader: options.loader,
            clock,
            flights: Group::new(),
        })
    }

    /// Inserts `key → value` only if the key is absent, with the default
    /// TTL (if configured). Returns `false` on a duplicate key or a
    /// closed cache; no update is performed either way.
    pub fn add(&self, key: K, value: V) -> bool {
        if self.is_closed() {
            return false;
        }
        let exp = self.default_deadline();
        let cost = self.cost_of(&value);
        self.shard(&key).add(key, value, exp, cost)
    }

    /// Inserts or updates `key → value` with the default TTL (if
    /// configured), promoting the entry per the active policy. Dropped
    /// silently on a closed cache.
    pub fn set(&self, key: K, value: V) {
        if self.is_closed() {
            return;
        }
        let exp = self.default_deadline();
        let cost = self.cost_of(&value);
        self.shard(&key).set(key, value, exp, cost);
    }

    /// Like [`set`](Cache::set), but with a per-key TTL. A zero `ttl`
    /// disables expiration for this entry.
    pub fn set_with_ttl(&self, key: K, value: V, ttl: Duration) {
        if self.is_closed() {
            return;
        }
        let exp = self.deadline(ttl);
        let cost = self.cost_of(&value);
        self.shard(&key).set(key, value, exp, cost);
    }

    /// Returns the value for `key`, promoting the entry per the active
    /// policy. An entry past its deadline is evicted here and reported as
    /// a miss. A closed cache always misses.
    pub fn get(&self, key: &K) -> Option<V> {
        if self.is_closed() {
            return None;
        }
        self.shard(key).get(key)
    }

    /// Deletes `key` if present; returns `true` on success. Not counted
    /// as an eviction. Returns `false` on a closed cache.
    pub fn remove(&self, key: &K) -> bool {
        if self.is_closed() {
            return false;
        }
        self.shard(key).remove(key)
    }

    /// Total resident entries across all shards (each read under that
    /// shard's shared lock).
    pub fn len(&self) -> usize {
        self.shards.iter().map(Shard::len).sum()
    }

    /// Returns `true` if no entries are resident.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Aggregated hit/miss/eviction counters and size across all shards.
    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats::default();
        for shard in &self.shards {
            stats.entries += shard.len();
            stats.cost += shard.cost();
            stats.hits += shard.hit_count();
            stats.misses += shard.miss_count();
            stats.evictions += shard.eviction_count();
        }
        stats
    }

    /// Returns the value for `key`, loading it via the configured loader
    /// on miss. Concurrent loads for the same key are coalesced so the
    /// loader runs at most once per in-flight window; every waiter shares
    /// the result. Loader errors are surfaced unchanged (wrapped in
    /// [`LoadError::Failed`]) and never cached.
    ///
    /// Cancelling `ctx` releases only this caller while it waits on
    /// another caller's load; a load already running is not interrupted.
    ///
    /// # Errors
    ///
    /// [`LoadError::NoLoader`] if no loader was configured;
    /// [`LoadError::Canceled`] / [`LoadError::DeadlineExceeded`] if `ctx`
    /// finished first; [`LoadError::Failed`] if the loader failed.
    pub fn get_or_load(&self, ctx: &Context, key: &K) -> Result<V, LoadError> {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let loader = match &self.loader {
            Some(loader) => Arc::clone(loader),
            None => return Err(LoadError::NoLoader),
        };

        self.flights.run(ctx, key, || {
            // Re-check after joining the flight: the value may have
            // landed between the first miss and the leader election.
            if let Some(value) = self.get(key) {
                return Ok(value);
            }
            match loader(ctx, key) {
                Ok(value) => {
                    self.set(key.clone(), value.clone());
                    Ok(value)
                }
                Err(err) => Err(LoadError::Failed(Arc::from(err))),
            }
        })
    }

    /// Marks the cache closed. Subsequent `add`/`remove` return `false`,
    /// `set`/`set_with_ttl` are dropped, and `get` misses; `len` and
    /// `stats` stay readable. A closed cache is never reopened.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once [`close`](Cache::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of shards the keyspace is split across.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn shard(&self, key: &K) -> &Shard<K, V> {
        &self.shards[self.selector.index(key.hash64())]
    }

    /// Absolute deadline for the configured default TTL, or 0 (never).
    fn default_deadline(&self) -> u64 {
        match self.default_ttl {
            Some(ttl) => self.deadline(ttl),
            None => 0,
        }
    }

    /// Converts a relative TTL into an absolute clock deadline; zero
    /// disables expiration.
    fn deadline(&self, ttl: Duration) -> u64 {
        if ttl.is_zero() {
            return 0;
        }
        self.clock
            .now_nanos()
            .saturating_add(ttl.as_nanos().min(u128::from(u64::MAX)) as u64)
    }

    /// Per-entry weight, clamped to `[0, i32::MAX]`.
    fn cost_of(&self, value: &V) -> u32 {
        match &self.cost_fn {
            Some(cost) => cost(value).clamp(0, i64::from(i32::MAX)) as u32,
            None => 0,
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub(crate) fn debug_validate_invariants(&self) {
        for shard in &self.shards {
            shard.debug_validate_invariants();
        }
    }
}
