//! Cancellation and deadline propagation for loader calls.
//!
//! A [`Context`] is a cheap, clonable handle the caller threads through
//! [`Cache::get_or_load`](crate::cache::Cache::get_or_load). Cancelling it
//! (or letting its deadline pass) releases callers that are *waiting* on an
//! in-flight load; the load itself keeps running and its result still lands
//! in the cache for future callers. Loaders that want to stop early can
//! poll the same context themselves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::LoadError;

#[derive(Debug)]
struct CtxInner {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
}

/// Cancellation token with an optional deadline.
///
/// Clones share state: cancelling any clone cancels them all.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use shardcache::context::Context;
///
/// let ctx = Context::with_timeout(Duration::from_secs(2));
/// assert!(!ctx.is_done());
///
/// let child = ctx.clone();
/// child.cancel();
/// assert!(ctx.is_done());
/// ```
#[derive(Debug, Clone)]
pub struct Context {
    inner: Arc<CtxInner>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self {
            inner: Arc::new(CtxInner {
                cancelled: AtomicBool::new(false),
                deadline: None,
            }),
        }
    }

    /// A context that is done once `deadline` passes.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            inner: Arc::new(CtxInner {
                cancelled: AtomicBool::new(false),
                deadline: Some(deadline),
            }),
        }
    }

    /// A context that is done `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Cancels this context and all clones sharing its state.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
    }

    /// Returns `true` if `cancel` was called on this context or a clone.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Returns the deadline, if one was set.
    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Returns `true` if the context is cancelled or past its deadline.
    pub fn is_done(&self) -> bool {
        self.done_err().is_some()
    }

    /// Returns the error describing why the context is done, or `None`
    /// while it is still live. Cancellation wins over the deadline when
    /// both apply.
    pub(crate) fn done_err(&self) -> Option<LoadError> {
        if self.is_cancelled() {
            return Some(LoadError::Canceled);
        }
        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(LoadError::DeadlineExceeded),
            _ => None,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}
