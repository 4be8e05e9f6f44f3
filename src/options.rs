//! Cache configuration: the options record, eviction reasons, and the
//! clock abstraction.
//!
//! Zero values are safe everywhere except `capacity`, which must be set;
//! defaults are applied in [`Cache::new`](crate::cache::Cache::new):
//! no metrics sink → [`NoopMetrics`](crate::metrics::NoopMetrics), no
//! policy → LRU, `shards == 0` → an automatic power-of-two count derived
//! from available parallelism.

use std::sync::Arc;
use std::time::Duration;

use crate::context::Context;
use crate::metrics::Metrics;
use crate::policy::Policy;

/// Why the cache removed an entry.
///
/// The variant set is stable; exporters may rely on
/// [`as_str`](EvictReason::as_str) for label values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvictReason {
    /// Removed by the active eviction policy (a policy nomination, or tail
    /// eviction while enforcing the entry-count limit).
    Policy,
    /// Expired by TTL; expiration is enforced lazily on access.
    Ttl,
    /// Removed to satisfy the cost limit.
    Capacity,
}

impl EvictReason {
    /// Stable label value for exporters.
    pub fn as_str(self) -> &'static str {
        match self {
            EvictReason::Policy => "policy",
            EvictReason::Ttl => "ttl",
            EvictReason::Capacity => "capacity",
        }
    }
}

impl std::fmt::Display for EvictReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time source in nanoseconds; override it for deterministic TTL tests.
pub trait Clock: Send + Sync {
    /// Current time as nanoseconds since an arbitrary fixed epoch.
    fn now_nanos(&self) -> u64;
}

/// Default `Clock` backed by the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_nanos(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    }
}

/// Computes a per-entry weight from the value (e.g. bytes). Results are
/// clamped to `[0, i32::MAX]`.
pub type CostFn<V> = Arc<dyn Fn(&V) -> i64 + Send + Sync>;

/// Fetches a value on cache miss; used by `get_or_load`.
pub type LoaderFn<K, V> =
    Arc<dyn Fn(&Context, &K) -> Result<V, Box<dyn std::error::Error + Send + Sync>> + Send + Sync>;

/// Called for every eviction, under the shard lock. Keep it lightweight.
pub type EvictCallback<K, V> = Arc<dyn Fn(&K, &V, EvictReason) + Send + Sync>;

/// Configures cache behavior. Construct with [`Options::new`] and adjust
/// fields directly, or use the fluent
/// [`CacheBuilder`](crate::builder::CacheBuilder).
#[derive(Clone)]
pub struct Options<K, V> {
    /// Entry-count limit across all shards (required, > 0). Used together
    /// with `max_cost` if that is set.
    pub capacity: usize,

    /// Number of shards. 0 picks an automatic value (≈ 2 × parallelism);
    /// any other value is rounded up to the next power of two.
    pub shards: usize,

    /// Eviction policy factory; `None` means LRU.
    pub policy: Option<Arc<dyn Policy<K>>>,

    /// TTL applied by `add`/`set` when no per-key TTL is given. `None` (or
    /// a zero duration) disables default expiration.
    pub default_ttl: Option<Duration>,

    /// Per-entry weight function. `None` means all entries weigh 0.
    pub cost: Option<CostFn<V>>,

    /// Total cost limit across all shards; 0 disables cost limiting.
    pub max_cost: u64,

    /// Miss-fill function enabling `get_or_load`.
    pub loader: Option<LoaderFn<K, V>>,

    /// Eviction callback; runs under the shard lock.
    pub on_evict: Option<EvictCallback<K, V>>,

    /// Observability sink; `None` means a no-op sink.
    pub metrics: Option<Arc<dyn Metrics>>,

    /// Time source override; `None` means the system clock.
    pub clock: Option<Arc<dyn Clock>>,
}

impl<K, V> Options<K, V> {
    /// Options with the given capacity and every other knob at its
    /// default.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            shards: 0,
            policy: None,
            default_ttl: None,
            cost: None,
            max_cost: 0,
            loader: None,
            on_evict: None,
            metrics: None,
            clock: None,
        }
    }
}

impl<K, V> std::fmt::Debug for Options<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("capacity", &self.capacity)
            .field("shards", &self.shards)
            .field("policy", &self.policy.as_ref().map(|_| "..."))
            .field("default_ttl", &self.default_ttl)
            .field("cost", &self.cost.as_ref().map(|_| "..."))
            .field("max_cost", &self.max_cost)
            .field("loader", &self.loader.as_ref().map(|_| "..."))
            .field("on_evict", &self.on_evict.as_ref().map(|_| "..."))
            .field("metrics", &self.metrics.as_ref().map(|_| "..."))
            .field("clock", &self.clock.as_ref().map(|_| "..."))
            .finish()
    }
}
