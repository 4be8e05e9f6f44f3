//! Bounded recency list of ghost entries.
//!
//! Tracks recently evicted keys without their values, so an admission
//! policy can recognize a key it threw away a moment ago and give it a
//! second chance. The 2Q policy uses this as its A1out queue: keys leaving
//! the A1in probation queue are recorded here, and a re-admission that
//! finds its key among the ghosts bypasses probation.
//!
//! Implemented as an [`IntrusiveList`] of keys plus an `FxHashMap` index
//! for O(1) membership. `record` promotes an existing ghost to MRU; when
//! the list is over capacity, LRU ghosts are dropped.

use rustc_hash::FxHashMap;
use std::hash::Hash;

use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;

/// Bounded key-only recency list for second-chance admission decisions.
///
/// A capacity of 0 creates a no-op ghost list that ignores all records.
#[derive(Debug)]
pub struct GhostList<K> {
    list: IntrusiveList<K>,
    index: FxHashMap<K, SlotId>,
    capacity: usize,
}

impl<K> GhostList<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates a ghost list holding at most `capacity` keys.
    pub fn new(capacity: usize) -> Self {
        Self {
            list: IntrusiveList::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            capacity,
        }
    }

    /// Returns the configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns `true` if there are no keys tracked.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Returns `true` if `key` is present (a "ghost hit").
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Records `key` as most-recently-evicted.
    ///
    /// An already-present key is promoted to the MRU position instead of
    /// being duplicated. If the list exceeds capacity afterwards, LRU keys
    /// are dropped until it fits.
    pub fn record(&mut self, key: K) {
        if self.capacity == 0 {
            return;
        }
        if let Some(&id) = self.index.get(&key) {
            self.list.move_to_front(id);
            return;
        }
        let id = self.list.push_front(key.clone());
        self.index.insert(key, id);
        while self.list.len() > self.capacity {
            match self.list.pop_back() {
                Some(old) => {
                    self.index.remove(&old);
                }
                None => break,
            }
        }
    }

    /// Removes `key` from the list; returns `true` if it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.index.remove(key) {
            Some(id) => {
                self.list.remove(id);
                true
            }
            None => false,
        }
    }

}

#[cfg(any(test, debug_assertions))]
impl<K> GhostList<K>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
{
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.list.len(), self.index.len());
        assert!(self.capacity == 0 || self.list.len() <= self.capacity);
        for (key, &id) in &self.index {
            assert_eq!(self.list.get(id), Some(key));
        }
        self.list.debug_validate_invariants();
    }
}
