//! shardcache: a fast, generic, sharded in-memory cache with pluggable
//! eviction policies (LRU by default, 2Q bundled), per-entry TTL, optional
//! cost-based capacity, singleflight loading, and lightweight metrics
//! hooks.
//!
//! ```
//! use shardcache::prelude::*;
//!
//! let cache = CacheBuilder::<String, String>::new(10_000)
//!     .build()
//!     .unwrap();
//! cache.set("a".to_string(), "1".to_string());
//! assert_eq!(cache.get(&"a".to_string()), Some("1".to_string()));
//! ```

pub mod builder;
pub mod cache;
pub mod context;
pub mod ds;
pub mod error;
pub mod metrics;
pub mod options;
pub mod policy;
pub mod prelude;

mod shard;
mod singleflight;
