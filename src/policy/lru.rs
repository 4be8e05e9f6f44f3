//! Least-recently-used eviction policy.
//!
//! Classic move-to-front LRU. The policy itself keeps no state and never
//! nominates victims: it maintains the chain so the least recently used
//! entry drifts to the tail, and the shard's limit enforcement evicts from
//! there.

use crate::ds::SlotId;
use crate::policy::{Hooks, Policy, ShardPolicy};

/// LRU policy factory; the default policy of the cache.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use shardcache::builder::CacheBuilder;
/// use shardcache::policy::Lru;
///
/// let cache = CacheBuilder::<u64, &str>::new(100)
///     .policy(Arc::new(Lru))
///     .build()
///     .unwrap();
/// cache.set(1, "one");
/// assert_eq!(cache.get(&1), Some("one"));
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct Lru;

impl<K> Policy<K> for Lru {
    fn build(&self) -> Box<dyn ShardPolicy<K>> {
        Box::new(LruShard)
    }
}

struct LruShard;

impl<K> ShardPolicy<K> for LruShard {
    /// Places the new entry at MRU. LRU never picks victims itself; the
    /// shard enforces capacity and cost limits from the tail.
    fn on_add(&mut self, hooks: &mut dyn Hooks, id: SlotId, _key: &K) -> Option<SlotId> {
        hooks.push_front(id);
        None
    }

    fn on_get(&mut self, hooks: &mut dyn Hooks, id: SlotId) {
        hooks.move_to_front(id);
    }

    /// Updates count as recent use.
    fn on_update(&mut self, hooks: &mut dyn Hooks, id: SlotId) {
        hooks.move_to_front(id);
    }

    fn on_remove(&mut self, _hooks: &mut dyn Hooks, _id: SlotId, _key: &K) {}
}
