//! 2Q eviction policy: probationary A1in, implicit mature Am, and a
//! key-only A1out ghost queue.
//!
//! First sightings enter a short probation queue (A1in) alongside the
//! shard chain. If A1in overflows, its least recent member is nominated
//! for eviction and its key is remembered in the ghost queue (A1out). A
//! key that returns while its ghost is still warm bypasses probation and
//! is admitted straight to the mature set. Am is not tracked explicitly;
//! it is simply "resident but not in A1in". This attenuates one-hit-wonder
//! pollution: only entries seen twice within the A1in/A1out horizon earn a
//! long-lived spot.
//!
//! ## Queues
//!
//! ```text
//!   on_add(first sighting)     on_add(ghost hit)
//!          │                          │
//!          ▼                          ▼
//!   ┌─────────────┐  overflow   ┌──────────────┐
//!   │    A1in     │───────────► │ evicted; key │
//!   │ (resident)  │  nominate   │ → A1out ghost│
//!   └─────────────┘             └──────────────┘
//!          │ on_get / on_update         │ re-add within horizon
//!          ▼                            ▼
//!        Am ("resident, not in A1in") ◄─┘
//! ```
//!
//! Removals from Am do not populate ghosts. All state is per shard and
//! mutated under the shard lock.

use rustc_hash::FxHashMap;

use crate::ds::{GhostList, IntrusiveList, SlotId};
use crate::policy::{Hooks, Policy, ShardPolicy};

/// 2Q policy factory.
///
/// `cap_in` bounds the A1in probation queue and `cap_ghost` bounds the
/// A1out ghost queue; both are per-shard sizes and are clamped to at
/// least 1. Common choices: `cap_in` ≈ 25% of shard capacity, `cap_ghost`
/// ≈ 50–100% of shard capacity.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use shardcache::builder::CacheBuilder;
/// use shardcache::policy::TwoQ;
///
/// let cache = CacheBuilder::<String, u64>::new(1024)
///     .policy(Arc::new(TwoQ::new(64, 128)))
///     .build()
///     .unwrap();
/// cache.set("hot".to_string(), 1);
/// assert_eq!(cache.get(&"hot".to_string()), Some(1));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TwoQ {
    cap_in: usize,
    cap_ghost: usize,
}

impl TwoQ {
    /// Creates a factory with per-shard A1in and A1out capacities.
    pub fn new(cap_in: usize, cap_ghost: usize) -> Self {
        Self {
            cap_in: cap_in.max(1),
            cap_ghost: cap_ghost.max(1),
        }
    }
}

impl<K> Policy<K> for TwoQ
where
    K: Eq + std::hash::Hash + Clone + Send + Sync + 'static,
{
    fn build(&self) -> Box<dyn ShardPolicy<K>> {
        Box::new(TwoQShard {
            cap_in: self.cap_in,
            a1in: IntrusiveList::with_capacity(self.cap_in + 1),
            a1in_index: FxHashMap::default(),
            ghosts: GhostList::new(self.cap_ghost),
        })
    }
}

/// Per-shard 2Q state.
struct TwoQShard<K> {
    cap_in: usize,
    /// Probation order, MRU at the front; values are shard entry ids.
    a1in: IntrusiveList<SlotId>,
    /// entry id → its node in `a1in`, for O(1) membership and removal.
    a1in_index: FxHashMap<SlotId, SlotId>,
    /// A1out: keys of entries recently evicted from probation.
    ghosts: GhostList<K>,
}

impl<K> TwoQShard<K>
where
    K: Eq + std::hash::Hash + Clone,
{
    /// Drops `id` from A1in tracking; returns `true` if it was tracked.
    fn leave_a1in(&mut self, id: SlotId) -> bool {
        match self.a1in_index.remove(&id) {
            Some(node) => {
                self.a1in.remove(node);
                true
            }
            None => false,
        }
    }
}

impl<K> ShardPolicy<K> for TwoQShard<K>
where
    K: Eq + std::hash::Hash + Clone + Send + Sync + 'static,
{
    /// Admission: a ghost hit bypasses probation and lands in Am; anything
    /// else enters A1in. Overflowing A1in nominates its LRU member.
    fn on_add(&mut self, hooks: &mut dyn Hooks, id: SlotId, key: &K) -> Option<SlotId> {
        if self.ghosts.remove(key) {
            // Second chance: straight to the mature set.
            hooks.push_front(id);
            return None;
        }

        hooks.push_front(id);
        let node = self.a1in.push_front(id);
        self.a1in_index.insert(id, node);

        if self.a1in.len() > self.cap_in {
            return self.a1in.back().copied();
        }
        None
    }

    /// A hit graduates the entry out of A1in (into the implicit Am) and
    /// promotes it in the shard chain.
    fn on_get(&mut self, hooks: &mut dyn Hooks, id: SlotId) {
        self.leave_a1in(id);
        hooks.move_to_front(id);
    }

    fn on_update(&mut self, hooks: &mut dyn Hooks, id: SlotId) {
        self.on_get(hooks, id);
    }

    /// Only removals out of A1in leave a ghost behind; Am removals vanish
    /// without trace.
    fn on_remove(&mut self, _hooks: &mut dyn Hooks, id: SlotId, key: &K) {
        if self.leave_a1in(id) {
            self.ghosts.record(key.clone());
        }
    }
}
