pub use crate::builder::CacheBuilder;
pub use crate::cache::{Cache, CacheStats};
pub use crate::context::Context;
pub use crate::ds::hash::CacheKey;
pub use crate::error::{ConfigError, LoadError};
pub use crate::metrics::{AtomicMetrics, CacheMetricsSnapshot, Metrics, NoopMetrics};
pub use crate::options::{Clock, EvictReason, Options, SystemClock};
pub use crate::policy::{Lru, Policy, TwoQ};
