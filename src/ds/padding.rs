//! Cache-line padding for hot per-shard counters.
//!
//! Hit/miss/eviction counters are bumped on every lookup; if they share a
//! cache line, cores ping-pong the line and throughput drops at high core
//! counts. `CachePadded<T>` aligns each counter to its own 64-byte line so
//! neighboring atomics never share one.

use std::ops::{Deref, DerefMut};

/// Cache line size assumed for padding. 64 bytes covers current x86-64 and
/// most aarch64 parts.
pub const CACHE_LINE_SIZE: usize = 64;

/// Aligns `T` to a full cache line so adjacent instances never share one.
#[derive(Debug, Default)]
#[repr(align(64))]
pub struct CachePadded<T> {
    value: T,
}

impl<T> CachePadded<T> {
    /// Wraps `value` in cache-line-aligned storage.
    pub const fn new(value: T) -> Self {
        Self { value }
    }

    /// Consumes the wrapper and returns the inner value.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for CachePadded<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for CachePadded<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

// Alignment must be exactly one cache line for any payload that fits in one.
const _: () = assert!(std::mem::align_of::<CachePadded<u64>>() == CACHE_LINE_SIZE);
const _: () = assert!(std::mem::size_of::<CachePadded<u64>>() == CACHE_LINE_SIZE);
