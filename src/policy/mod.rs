//! Pluggable eviction policies.
//!
//! A policy never touches the shard's key→entry map; it observes admission,
//! access, update, and removal events and steers ordering through a narrow
//! [`Hooks`] surface over the shard's MRU↔LRU chain. The shard performs all
//! real removals; a policy can at most *nominate* a victim from `on_add`.
//!
//! ## Contract
//!
//! ```text
//!   shard (owns map + chain + lock)
//!     │  on_add(id, key) ──► may return Some(victim id)
//!     │  on_get(id)                                       policy
//!     │  on_update(id)                                    (per-shard
//!     │  on_remove(id, key)                                instance)
//!     ▼
//!   Hooks: push_front / move_to_front / unlink / back / len
//! ```
//!
//! Every callback and every hook call executes while the shard lock is
//! held, so policy state needs no synchronization of its own. A [`Policy`]
//! factory builds one independent [`ShardPolicy`] instance per shard.
//!
//! Bundled policies: [`lru::Lru`] (the default) and [`two_q::TwoQ`]
//! (scan-resistant, with a ghost queue).

pub mod lru;
pub mod two_q;

pub use lru::Lru;
pub use two_q::TwoQ;

use crate::ds::SlotId;

/// O(1) operations on the shard's resident MRU↔LRU chain, exposed to
/// policies. Implemented by the shard; all calls happen under its lock.
pub trait Hooks {
    /// Links `id` at the MRU position (used on admission).
    fn push_front(&mut self, id: SlotId);

    /// Promotes `id` to the MRU position.
    fn move_to_front(&mut self, id: SlotId);

    /// Detaches `id` from the chain. Map bookkeeping stays with the shard.
    fn unlink(&mut self, id: SlotId);

    /// Returns the current LRU entry, if any.
    fn back(&self) -> Option<SlotId>;

    /// Returns the number of resident entries in the shard.
    fn len(&self) -> usize;
}

/// Per-shard eviction policy instance.
///
/// Semantics:
/// - `on_add` places the new entry in the chain (typically `push_front`)
///   and may return a victim the shard should evict (2Q nominates its
///   probation LRU on overflow). The shard then performs the removal and
///   calls `on_remove` for the victim.
/// - `on_get`/`on_update` typically promote the entry.
/// - `on_remove` is a notification fired before the shard removes an
///   entry for any reason; the policy updates its own bookkeeping (e.g.
///   ghost queues) and must not unlink the entry itself.
pub trait ShardPolicy<K>: Send + Sync {
    fn on_add(&mut self, hooks: &mut dyn Hooks, id: SlotId, key: &K) -> Option<SlotId>;

    fn on_get(&mut self, hooks: &mut dyn Hooks, id: SlotId);

    fn on_update(&mut self, hooks: &mut dyn Hooks, id: SlotId);

    fn on_remove(&mut self, hooks: &mut dyn Hooks, id: SlotId, key: &K);
}

/// Factory that creates one [`ShardPolicy`] instance per shard.
pub trait Policy<K>: Send + Sync {
    fn build(&self) -> Box<dyn ShardPolicy<K>>;
}
