// ==============================================
// END-TO-END CACHE SCENARIOS (integration)
// ==============================================
//
// Deterministic single- and multi-shard scenarios exercising the public
// surface: add/set/get/remove semantics, LRU ordering, TTL with an
// injected clock, 2Q second-chance admission, cost-based limits, and
// eviction-reason accounting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use shardcache::prelude::*;

struct FakeClock(AtomicU64);

impl FakeClock {
    fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    fn advance(&self, by: Duration) {
        self.0.fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now_nanos(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

// ==============================================
// Basic Add/Set/Get/Remove
// ==============================================

#[test]
fn basic_add_set_get_remove() {
    let cache = CacheBuilder::<&str, u32>::new(8).build().unwrap();

    assert!(cache.add("a", 1));
    assert!(!cache.add("a", 2), "duplicate add must be rejected");
    assert_eq!(cache.get(&"a"), Some(1), "failed add must not overwrite");

    cache.set("a", 11);
    assert_eq!(cache.get(&"a"), Some(11));

    assert!(cache.remove(&"a"));
    assert!(!cache.remove(&"a"), "second remove must report absence");
    assert_eq!(cache.get(&"a"), None);
    assert_eq!(cache.len(), 0);
}

#[test]
fn set_round_trip() {
    let cache = CacheBuilder::<String, String>::new(16).build().unwrap();
    cache.set("k".to_string(), "v".to_string());
    assert_eq!(cache.get(&"k".to_string()), Some("v".to_string()));
}

// ==============================================
// Single-Shard LRU Eviction
// ==============================================

#[test]
fn lru_eviction_prefers_cold_entries() {
    let cache = CacheBuilder::<&str, u32>::new(2).shards(1).build().unwrap();

    cache.set("a", 1); // LRU = a
    cache.set("b", 2); // MRU = b

    assert_eq!(cache.get(&"a"), Some(1)); // promote a
    cache.set("c", 3); // overflow evicts the tail (b)

    assert_eq!(cache.get(&"b"), None, "b must be evicted");
    assert_eq!(cache.get(&"a"), Some(1), "a must survive (promoted)");
    assert_eq!(cache.get(&"c"), Some(3));
    assert_eq!(cache.len(), 2);
}

#[test]
fn lru_inserting_past_capacity_drops_oldest() {
    let capacity = 4;
    let cache = CacheBuilder::<u64, u64>::new(capacity)
        .shards(1)
        .build()
        .unwrap();

    // Insert capacity + 1 distinct keys without intervening reads.
    for i in 0..=(capacity as u64) {
        cache.set(i, i * 10);
    }
    assert_eq!(cache.get(&0), None, "first key must be evicted");
    for i in 1..=(capacity as u64) {
        assert_eq!(cache.get(&i), Some(i * 10));
    }
}

// ==============================================
// TTL with an Injected Clock
// ==============================================

#[test]
fn ttl_expires_lazily_with_one_ttl_eviction() {
    let clock = Arc::new(FakeClock::new());
    let metrics = Arc::new(AtomicMetrics::new());
    let cache = CacheBuilder::<&str, &str>::new(4)
        .shards(1)
        .clock(clock.clone())
        .metrics(metrics.clone())
        .build()
        .unwrap();

    cache.set_with_ttl("x", "v", Duration::from_millis(100));
    assert_eq!(cache.get(&"x"), Some("v"), "fresh entry must hit");

    clock.advance(Duration::from_millis(200));
    assert_eq!(cache.get(&"x"), None, "expired entry must miss");
    assert_eq!(cache.len(), 0);

    let snap = metrics.snapshot();
    assert_eq!(snap.evictions_ttl, 1, "exactly one TTL eviction");
    assert_eq!(snap.evictions_policy, 0);
    assert_eq!(snap.evictions_capacity, 0);
    assert_eq!(snap.hits, 1);
    assert_eq!(snap.misses, 1);
}

#[test]
fn zero_ttl_disables_expiration() {
    let clock = Arc::new(FakeClock::new());
    let cache = CacheBuilder::<&str, u32>::new(4)
        .clock(clock.clone())
        .build()
        .unwrap();

    cache.set_with_ttl("forever", 1, Duration::ZERO);
    clock.advance(Duration::from_secs(3600));
    assert_eq!(cache.get(&"forever"), Some(1));
}

#[test]
fn default_ttl_applies_to_plain_set() {
    let clock = Arc::new(FakeClock::new());
    let cache = CacheBuilder::<&str, u32>::new(4)
        .shards(1)
        .default_ttl(Duration::from_millis(50))
        .clock(clock.clone())
        .build()
        .unwrap();

    cache.set("x", 1);
    assert_eq!(cache.get(&"x"), Some(1));
    clock.advance(Duration::from_millis(100));
    assert_eq!(cache.get(&"x"), None);
}

// ==============================================
// 2Q Ghost Second Chance
// ==============================================

#[test]
fn two_q_ghost_readmission_bypasses_probation() {
    let cache = CacheBuilder::<&str, u32>::new(16)
        .shards(1)
        .policy(Arc::new(TwoQ::new(2, 2)))
        .build()
        .unwrap();

    // First sightings flow through A1in (capacity 2); the third add
    // overflows probation and evicts its LRU member, "a".
    assert!(cache.add("a", 1));
    assert!(cache.add("b", 2));
    assert!(cache.add("c", 3));
    assert_eq!(cache.get(&"a"), None, "a must be evicted from probation");
    assert_eq!(cache.len(), 2);

    cache.remove(&"c");

    // "a" is still a warm ghost, so its re-admission lands in the mature
    // set. A later probation overflow must nominate the newer probation
    // member ("b") and leave "a" alone.
    assert!(cache.add("a", 10));
    assert!(cache.add("d", 4));
    assert!(cache.add("e", 5)); // probation overflow: victim is "b"

    assert_eq!(cache.get(&"a"), Some(10), "readmitted a must survive");
    assert_eq!(cache.get(&"b"), None, "the probation member must go instead");
    assert_eq!(cache.get(&"d"), Some(4));
    assert_eq!(cache.get(&"e"), Some(5));
}

#[test]
fn two_q_hit_graduates_out_of_probation() {
    let cache = CacheBuilder::<&str, u32>::new(16)
        .shards(1)
        .policy(Arc::new(TwoQ::new(2, 4)))
        .build()
        .unwrap();

    cache.add("a", 1);
    assert_eq!(cache.get(&"a"), Some(1)); // graduates to the mature set

    // Probation can now overflow twice without ever touching "a".
    cache.add("b", 2);
    cache.add("c", 3);
    cache.add("d", 4);
    cache.add("e", 5);

    assert_eq!(cache.get(&"a"), Some(1));
}

// ==============================================
// Cost-Based Eviction
// ==============================================

#[test]
fn cost_limit_bounds_total_weight() {
    let metrics = Arc::new(AtomicMetrics::new());
    let cache = CacheBuilder::<String, String>::new(100)
        .shards(1)
        .cost(|v| v.len() as i64)
        .max_cost(10)
        .metrics(metrics.clone())
        .build()
        .unwrap();

    for i in 0..10 {
        cache.set(format!("k{i}"), "abc".to_string()); // 3 bytes each
        let stats = cache.stats();
        assert!(stats.cost <= 10, "cost {} exceeds the limit", stats.cost);
    }

    let snap = metrics.snapshot();
    assert!(snap.evictions_capacity > 0, "cost evictions must be reported");
    assert_eq!(snap.evictions_policy, 0);
    assert_eq!(snap.evictions_ttl, 0);
}

// ==============================================
// Eviction-Reason Accounting
// ==============================================

#[test]
fn every_internal_removal_is_classified_and_remove_is_not() {
    let clock = Arc::new(FakeClock::new());
    let metrics = Arc::new(AtomicMetrics::new());
    let events: Arc<Mutex<Vec<EvictReason>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();

    let cache = CacheBuilder::<String, String>::new(2)
        .shards(1)
        .cost(|v| v.len() as i64)
        .max_cost(8)
        .clock(clock.clone())
        .metrics(metrics.clone())
        .on_evict(move |_k, _v, reason| sink.lock().unwrap().push(reason))
        .build()
        .unwrap();

    // Policy eviction: third insert overflows the entry count.
    cache.set("a".to_string(), "1".to_string());
    cache.set("b".to_string(), "2".to_string());
    cache.set("c".to_string(), "3".to_string());

    // TTL eviction.
    cache.set_with_ttl("t".to_string(), "4".to_string(), Duration::from_millis(10));
    clock.advance(Duration::from_millis(20));
    assert_eq!(cache.get(&"t".to_string()), None);

    // Capacity eviction: an oversized value pushes cost past the limit.
    cache.set("big".to_string(), "123456789".to_string());

    // Explicit remove: never an eviction.
    cache.set("z".to_string(), "5".to_string());
    assert!(cache.remove(&"z".to_string()));

    let snap = metrics.snapshot();
    let seen = events.lock().unwrap();
    assert_eq!(
        snap.evictions(),
        seen.len() as u64,
        "every eviction signal must match an on_evict call"
    );
    assert!(snap.evictions_policy >= 1);
    assert_eq!(snap.evictions_ttl, 1);
    assert!(snap.evictions_capacity >= 1);
    assert_eq!(cache.stats().evictions, snap.evictions());
}

// ==============================================
// Closed-Cache Semantics
// ==============================================

#[test]
fn close_makes_mutations_no_ops() {
    let cache = CacheBuilder::<&str, u32>::new(8).build().unwrap();
    cache.set("a", 1);
    cache.close();

    assert!(!cache.add("b", 2));
    cache.set("c", 3);
    cache.set_with_ttl("d", 4, Duration::from_secs(1));
    assert!(!cache.remove(&"a"));
    assert_eq!(cache.get(&"a"), None, "closed cache must miss");

    assert_eq!(cache.len(), 1, "len stays queryable after close");
}

// ==============================================
// Metrics Plumbing
// ==============================================

#[test]
fn hit_and_miss_signals_match_counters() {
    let metrics = Arc::new(AtomicMetrics::new());
    let cache = CacheBuilder::<u64, u64>::new(64)
        .metrics(metrics.clone())
        .build()
        .unwrap();

    for i in 0..10u64 {
        cache.set(i, i);
    }
    for i in 0..10u64 {
        assert_eq!(cache.get(&i), Some(i));
    }
    cache.get(&100);
    cache.get(&101);

    let snap = metrics.snapshot();
    assert_eq!(snap.hits, 10);
    assert_eq!(snap.misses, 2);

    let stats = cache.stats();
    assert_eq!(stats.hits, snap.hits);
    assert_eq!(stats.misses, snap.misses);
    assert_eq!(stats.entries, 10);
}
