//! Fluent cache builder.
//!
//! Wraps [`Options`] in a chainable API so callers don't have to spell out
//! the record (and its `Arc`-wrapped callback types) by hand.
//!
//! ## Example
//!
//! ```rust
//! use std::time::Duration;
//! use shardcache::builder::CacheBuilder;
//!
//! let cache = CacheBuilder::<String, Vec<u8>>::new(10_000)
//!     .default_ttl(Duration::from_secs(60))
//!     .cost(|v| v.len() as i64)
//!     .max_cost(64 << 20)
//!     .build()
//!     .unwrap();
//! cache.set("a".to_string(), vec![1, 2, 3]);
//! assert_eq!(cache.get(&"a".to_string()), Some(vec![1, 2, 3]));
//! ```

use std::sync::Arc;
use std::time::Duration;

use crate::cache::Cache;
use crate::context::Context;
use crate::ds::hash::CacheKey;
use crate::error::ConfigError;
use crate::metrics::Metrics;
use crate::options::{Clock, EvictReason, Options};
use crate::policy::Policy;

/// Builder for [`Cache`] instances.
pub struct CacheBuilder<K, V> {
    options: Options<K, V>,
}

impl<K, V> CacheBuilder<K, V>
where
    K: CacheKey,
    V: Clone + Send + Sync + 'static,
{
    /// Starts a builder for a cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            options: Options::new(capacity),
        }
    }

    /// Sets the shard count (rounded up to a power of two); 0 keeps the
    /// automatic choice.
    pub fn shards(mut self, shards: usize) -> Self {
        self.options.shards = shards;
        self
    }

    /// Sets the eviction policy factory; LRU if never called.
    pub fn policy(mut self, policy: Arc<dyn Policy<K>>) -> Self {
        self.options.policy = Some(policy);
        self
    }

    /// Applies `ttl` to entries inserted without a per-key TTL. A zero
    /// duration keeps expiration disabled.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.options.default_ttl = Some(ttl);
        self
    }

    /// Sets the per-entry weight function (e.g. bytes).
    pub fn cost(mut self, cost: impl Fn(&V) -> i64 + Send + Sync + 'static) -> Self {
        self.options.cost = Some(Arc::new(cost));
        self
    }

    /// Sets the total cost limit; 0 disables cost limiting.
    pub fn max_cost(mut self, max_cost: u64) -> Self {
        self.options.max_cost = max_cost;
        self
    }

    /// Sets the miss-fill function, enabling
    /// [`get_or_load`](Cache::get_or_load).
    pub fn loader(
        mut self,
        loader: impl Fn(&Context, &K) -> Result<V, Box<dyn std::error::Error + Send + Sync>>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.options.loader = Some(Arc::new(loader));
        self
    }

    /// Sets the eviction callback. It runs under the shard lock; keep it
    /// cheap and non-blocking.
    pub fn on_evict(mut self, on_evict: impl Fn(&K, &V, EvictReason) + Send + Sync + 'static) -> Self {
        self.options.on_evict = Some(Arc::new(on_evict));
        self
    }

    /// Sets the observability sink.
    pub fn metrics(mut self, metrics: Arc<dyn Metrics>) -> Self {
        self.options.metrics = Some(metrics);
        self
    }

    /// Overrides the time source (deterministic TTL tests).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.options.clock = Some(clock);
        self
    }

    /// Builds the cache.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid (zero
    /// capacity).
    pub fn build(self) -> Result<Cache<K, V>, ConfigError> {
        Cache::new(self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::AtomicMetrics;
    use crate::policy::TwoQ;

    #[test]
    fn builds_with_every_knob_set() {
        let metrics = Arc::new(AtomicMetrics::new());
        let cache = CacheBuilder::<String, String>::new(100)
            .shards(2)
            .policy(Arc::new(TwoQ::new(4, 8)))
            .default_ttl(Duration::from_secs(30))
            .cost(|v| v.len() as i64)
            .max_cost(1 << 20)
            .loader(|_ctx, key| Ok(format!("v:{key}")))
            .on_evict(|_k, _v, _reason| {})
            .metrics(metrics.clone())
            .build()
            .expect("valid config");

        cache.set("a".to_string(), "1".to_string());
        assert_eq!(cache.get(&"a".to_string()), Some("1".to_string()));
        assert_eq!(metrics.snapshot().hits, 1);
    }

    #[test]
    fn zero_capacity_fails_to_build() {
        let err = CacheBuilder::<u64, u64>::new(0)
            .build()
            .expect_err("capacity 0 must be rejected");
        assert!(err.message().contains("capacity"));
    }

    #[test]
    fn loader_enables_get_or_load() {
        let cache = CacheBuilder::<&str, String>::new(16)
            .loader(|_ctx, key| Ok(format!("v:{key}")))
            .build()
            .expect("valid config");

        let value = cache
            .get_or_load(&Context::background(), &"k")
            .expect("load");
        assert_eq!(value, "v:k");
        // Now cached.
        assert_eq!(cache.get(&"k"), Some("v:k".to_string()));
    }
}
