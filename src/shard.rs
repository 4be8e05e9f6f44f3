//! The per-shard cache engine.
//!
//! A shard owns an independent slice of the keyspace: a key→entry map, an
//! entry arena, an index-linked MRU↔LRU chain, running counters, and one
//! policy instance, all behind a single `RwLock`. `len` takes the read
//! lock; every other operation takes the write lock, because even `get`
//! can mutate (lazy TTL eviction, policy promotion).
//!
//! ```text
//!   ┌──────────────────────────── RwLock ────────────────────────────┐
//!   │  map: FxHashMap<K, SlotId>      arena: SlotArena<EntryNode>    │
//!   │  chain: head ─► MRU ◄──► … ◄──► LRU ◄─ tail                    │
//!   │  policy: Box<dyn ShardPolicy<K>>     cost / cap / max_cost     │
//!   └────────────────────────────────────────────────────────────────┘
//!     hits / misses / evictions: cache-line padded atomics (outside)
//! ```
//!
//! Eviction funnels through one routine: policy notification → chain
//! unlink → map delete → eviction counter → `Evict(reason)` metric → the
//! user `on_evict` callback, which runs while the lock is held. After
//! every mutating operation the shard evicts from the tail until both the
//! entry-count and cost limits hold, then emits `Size`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::ds::padding::CachePadded;
use crate::ds::{SlotArena, SlotId};
use crate::metrics::Metrics;
use crate::options::{Clock, EvictCallback, EvictReason};
use crate::policy::{Hooks, ShardPolicy};

/// A resident cache entry plus its chain links.
pub(crate) struct EntryNode<K, V> {
    key: K,
    value: V,
    /// Absolute expiration deadline in clock nanoseconds; 0 = never.
    exp_nanos: u64,
    /// Logical weight; 0 when cost accounting is unused.
    cost: u32,
    prev: Option<SlotId>,
    next: Option<SlotId>,
}

/// Index-linked MRU↔LRU chain over the shard's entry arena.
///
/// The chain stores only the endpoints; `prev`/`next` live on the entries
/// themselves, so every operation is O(1) and unlinked entries carry no
/// stale links.
#[derive(Debug, Default)]
struct EntryChain {
    head: Option<SlotId>,
    tail: Option<SlotId>,
}

impl EntryChain {
    /// Links `id` as the new head (MRU). The entry must be detached.
    fn push_front<K, V>(&mut self, arena: &mut SlotArena<EntryNode<K, V>>, id: SlotId) {
        let old_head = self.head;
        if let Some(node) = arena.get_mut(id) {
            node.prev = None;
            node.next = old_head;
        } else {
            return;
        }
        match old_head {
            Some(head) => {
                if let Some(head_node) = arena.get_mut(head) {
                    head_node.prev = Some(id);
                }
            }
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }

    /// Promotes `id` to the head; no-op if it already is the head.
    fn move_to_front<K, V>(&mut self, arena: &mut SlotArena<EntryNode<K, V>>, id: SlotId) {
        if self.head == Some(id) || !arena.contains(id) {
            return;
        }
        self.unlink(arena, id);
        self.push_front(arena, id);
    }

    /// Detaches `id` from the chain and clears its links.
    fn unlink<K, V>(&mut self, arena: &mut SlotArena<EntryNode<K, V>>, id: SlotId) {
        let (prev, next) = match arena.get(id) {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        match prev {
            Some(prev_id) => {
                if let Some(prev_node) = arena.get_mut(prev_id) {
                    prev_node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(next_id) => {
                if let Some(next_node) = arena.get_mut(next_id) {
                    next_node.prev = prev;
                }
            }
            None => self.tail = prev,
        }
        if let Some(node) = arena.get_mut(id) {
            node.prev = None;
            node.next = None;
        }
    }

    /// Returns the current LRU entry.
    fn back(&self) -> Option<SlotId> {
        self.tail
    }
}

/// Adapts the shard's chain to the [`Hooks`] surface policies consume.
struct ChainHooks<'a, K, V> {
    arena: &'a mut SlotArena<EntryNode<K, V>>,
    chain: &'a mut EntryChain,
}

impl<K, V> Hooks for ChainHooks<'_, K, V> {
    fn push_front(&mut self, id: SlotId) {
        self.chain.push_front(self.arena, id);
    }

    fn move_to_front(&mut self, id: SlotId) {
        self.chain.move_to_front(self.arena, id);
    }

    fn unlink(&mut self, id: SlotId) {
        self.chain.unlink(self.arena, id);
    }

    fn back(&self) -> Option<SlotId> {
        self.chain.back()
    }

    fn len(&self) -> usize {
        self.arena.len()
    }
}

struct ShardInner<K, V> {
    map: FxHashMap<K, SlotId>,
    arena: SlotArena<EntryNode<K, V>>,
    chain: EntryChain,
    /// Running sum of resident entry costs.
    cost: u64,
    /// Per-shard entry-count ceiling.
    cap: usize,
    /// Per-shard cost ceiling; 0 disables cost limiting.
    max_cost: u64,
    policy: Box<dyn ShardPolicy<K>>,
}

/// One lock's worth of the cache.
pub(crate) struct Shard<K, V> {
    inner: RwLock<ShardInner<K, V>>,
    metrics: Arc<dyn Metrics>,
    on_evict: Option<EvictCallback<K, V>>,
    clock: Arc<dyn Clock>,
    hits: CachePadded<AtomicU64>,
    misses: CachePadded<AtomicU64>,
    evictions: CachePadded<AtomicU64>,
}

impl<K, V> Shard<K, V>
where
    K: Eq + std::hash::Hash + Clone,
    V: Clone,
{
    pub(crate) fn new(
        cap: usize,
        max_cost: u64,
        policy: Box<dyn ShardPolicy<K>>,
        metrics: Arc<dyn Metrics>,
        on_evict: Option<EvictCallback<K, V>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cap = cap.max(1);
        Self {
            inner: RwLock::new(ShardInner {
                map: FxHashMap::with_capacity_and_hasher(cap, Default::default()),
                arena: SlotArena::with_capacity(cap),
                chain: EntryChain::default(),
                cost: 0,
                cap,
                max_cost,
                policy,
            }),
            metrics,
            on_evict,
            clock,
            hits: CachePadded::new(AtomicU64::new(0)),
            misses: CachePadded::new(AtomicU64::new(0)),
            evictions: CachePadded::new(AtomicU64::new(0)),
        }
    }

    /// Inserts a new entry; returns `false` without touching anything if
    /// the key is already present.
    pub(crate) fn add(&self, key: K, value: V, exp_nanos: u64, cost: u32) -> bool {
        let mut inner = self.inner.write();
        if inner.map.contains_key(&key) {
            return false;
        }
        self.insert_new(&mut inner, key, value, exp_nanos, cost);
        self.enforce_limits(&mut inner);
        true
    }

    /// Inserts or updates an entry; updates adjust the cost sum by the
    /// delta and count as recent use.
    pub(crate) fn set(&self, key: K, value: V, exp_nanos: u64, cost: u32) {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        if let Some(&id) = inner.map.get(&key) {
            if let Some(node) = inner.arena.get_mut(id) {
                let old_cost = u64::from(node.cost);
                node.value = value;
                node.exp_nanos = exp_nanos;
                node.cost = cost;
                inner.cost = inner.cost.saturating_sub(old_cost) + u64::from(cost);
            }
            {
                let ShardInner {
                    arena,
                    chain,
                    policy,
                    ..
                } = &mut *inner;
                policy.on_update(&mut ChainHooks { arena, chain }, id);
            }
            self.enforce_limits(inner);
            return;
        }
        self.insert_new(inner, key, value, exp_nanos, cost);
        self.enforce_limits(inner);
    }

    /// Looks up `key`, enforcing TTL lazily and promoting on hit.
    ///
    /// Takes the write lock: a hit mutates policy state and an expired
    /// entry is evicted in place.
    pub(crate) fn get(&self, key: &K) -> Option<V> {
        let mut inner = self.inner.write();
        let id = match inner.map.get(key) {
            Some(&id) => id,
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                self.metrics.miss();
                return None;
            }
        };

        let expired = inner
            .arena
            .get(id)
            .map(|node| node.exp_nanos != 0 && self.clock.now_nanos() > node.exp_nanos)
            .unwrap_or(false);
        if expired {
            self.evict(&mut inner, id, EvictReason::Ttl);
            self.misses.fetch_add(1, Ordering::Relaxed);
            self.metrics.miss();
            return None;
        }

        {
            let ShardInner {
                arena,
                chain,
                policy,
                ..
            } = &mut *inner;
            policy.on_get(&mut ChainHooks { arena, chain }, id);
        }
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.metrics.hit();
        inner.arena.get(id).map(|node| node.value.clone())
    }

    /// Deletes `key` if present. Explicit removes are not evictions: no
    /// eviction counter, no `Evict` signal, no `on_evict` callback.
    pub(crate) fn remove(&self, key: &K) -> bool {
        let mut inner = self.inner.write();
        let id = match inner.map.get(key) {
            Some(&id) => id,
            None => return false,
        };
        {
            let ShardInner {
                arena,
                chain,
                policy,
                ..
            } = &mut *inner;
            policy.on_remove(&mut ChainHooks { arena, chain }, id, key);
            chain.unlink(arena, id);
        }
        let removed = inner.arena.remove(id);
        inner.map.remove(key);
        if let Some(node) = removed {
            inner.cost = inner.cost.saturating_sub(u64::from(node.cost));
        }
        true
    }

    /// Number of resident entries, under the shared read lock.
    pub(crate) fn len(&self) -> usize {
        self.inner.read().map.len()
    }

    /// Total resident cost, under the shared read lock.
    pub(crate) fn cost(&self) -> u64 {
        self.inner.read().cost
    }

    pub(crate) fn hit_count(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub(crate) fn miss_count(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub(crate) fn eviction_count(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// New-entry path shared by `add` and `set`: create the node, let the
    /// policy place it (and possibly nominate a victim), then index it.
    fn insert_new(&self, inner: &mut ShardInner<K, V>, key: K, value: V, exp_nanos: u64, cost: u32) {
        let id = inner.arena.insert(EntryNode {
            key: key.clone(),
            value,
            exp_nanos,
            cost,
            prev: None,
            next: None,
        });
        let victim = {
            let ShardInner {
                arena,
                chain,
                policy,
                ..
            } = inner;
            policy.on_add(&mut ChainHooks { arena, chain }, id, &key)
        };
        inner.map.insert(key, id);
        inner.cost += u64::from(cost);

        if let Some(victim) = victim {
            self.evict(inner, victim, EvictReason::Policy);
        }
    }

    /// The single eviction routine: policy notification, chain unlink, map
    /// delete, counters, `Evict` signal, user callback, in that order,
    /// with the lock held throughout.
    fn evict(&self, inner: &mut ShardInner<K, V>, id: SlotId, reason: EvictReason) {
        let key = match inner.arena.get(id) {
            Some(node) => node.key.clone(),
            None => return,
        };
        {
            let ShardInner {
                arena,
                chain,
                policy,
                ..
            } = inner;
            policy.on_remove(&mut ChainHooks { arena, chain }, id, &key);
            chain.unlink(arena, id);
        }
        let node = match inner.arena.remove(id) {
            Some(node) => node,
            None => return,
        };
        inner.map.remove(&key);
        inner.cost = inner.cost.saturating_sub(u64::from(node.cost));

        self.evictions.fetch_add(1, Ordering::Relaxed);
        self.metrics.evict(reason);
        if let Some(callback) = &self.on_evict {
            // Runs under the shard lock; callbacks must stay cheap.
            callback(&node.key, &node.value, reason);
        }
    }

    /// Evicts tail entries until both the entry-count and cost limits
    /// hold, then reports the shard size.
    fn enforce_limits(&self, inner: &mut ShardInner<K, V>) {
        while inner.map.len() > inner.cap {
            match inner.chain.back() {
                Some(tail) => self.evict(inner, tail, EvictReason::Policy),
                None => break,
            }
        }
        if inner.max_cost > 0 {
            while inner.cost > inner.max_cost {
                match inner.chain.back() {
                    Some(tail) => self.evict(inner, tail, EvictReason::Capacity),
                    None => break,
                }
            }
        }
        self.metrics.size(inner.map.len(), inner.cost);
    }

    #[cfg(any(test, debug_assertions))]
    pub(crate) fn debug_validate_invariants(&self) {
        let inner = self.inner.read();
        assert_eq!(inner.map.len(), inner.arena.len());
        assert!(inner.map.len() <= inner.cap);
        if inner.max_cost > 0 {
            assert!(inner.cost <= inner.max_cost);
        }

        let mut count = 0usize;
        let mut cost = 0u64;
        let mut current = inner.chain.head;
        let mut prev = None;
        while let Some(id) = current {
            let node = inner.arena.get(id).expect("chain entry missing from arena");
            assert_eq!(node.prev, prev);
            assert_eq!(inner.map.get(&node.key), Some(&id));
            cost += u64::from(node.cost);
            prev = Some(id);
            current = node.next;
            count += 1;
            assert!(count <= inner.arena.len());
        }
        assert_eq!(inner.chain.tail, prev);
        assert_eq!(count, inner.map.len());
        assert_eq!(cost, inner.cost);
    }
}
