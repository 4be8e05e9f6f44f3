//! Error types for the shardcache library.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when cache configuration parameters are
//!   invalid (e.g. zero capacity).
//! - [`LoadError`]: Returned by `get_or_load`: no loader configured,
//!   caller cancellation, or a loader failure shared by every coalesced
//!   waiter.
//!
//! ## Example Usage
//!
//! ```
//! use shardcache::builder::CacheBuilder;
//! use shardcache::error::ConfigError;
//!
//! // Fallible construction for user-configurable parameters
//! let cache = CacheBuilder::<u64, String>::new(100).build();
//! assert!(cache.is_ok());
//!
//! // Zero capacity is caught without panicking
//! let bad = CacheBuilder::<u64, String>::new(0).build();
//! assert!(bad.is_err());
//! ```

use std::fmt;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by [`Cache::new`](crate::cache::Cache::new) and
/// [`CacheBuilder::build`](crate::builder::CacheBuilder::build). Carries a
/// human-readable description of which parameter failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// LoadError
// ---------------------------------------------------------------------------

/// Error surface of [`Cache::get_or_load`](crate::cache::Cache::get_or_load).
///
/// `Failed` wraps the loader's own error in an `Arc` because a single load
/// may be observed by many coalesced callers; each receives the same shared
/// error. Loader failures are never cached.
#[derive(Debug, Clone)]
pub enum LoadError {
    /// `get_or_load` was called but no loader was configured.
    NoLoader,
    /// The caller's context was cancelled while waiting for an in-flight
    /// load. The load itself keeps running.
    Canceled,
    /// The caller's context deadline passed while waiting for an in-flight
    /// load. The load itself keeps running.
    DeadlineExceeded,
    /// The loader returned an error; shared by every waiter of the flight.
    Failed(Arc<dyn std::error::Error + Send + Sync + 'static>),
}

impl LoadError {
    /// Returns `true` for the cancellation outcomes (`Canceled` /
    /// `DeadlineExceeded`).
    pub fn is_cancellation(&self) -> bool {
        matches!(self, LoadError::Canceled | LoadError::DeadlineExceeded)
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::NoLoader => f.write_str("cache: no loader configured"),
            LoadError::Canceled => f.write_str("cache: context canceled"),
            LoadError::DeadlineExceeded => f.write_str("cache: context deadline exceeded"),
            LoadError::Failed(err) => write!(f, "cache: load failed: {err}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Failed(err) => Some(err.as_ref() as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
