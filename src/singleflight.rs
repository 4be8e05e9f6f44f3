//! Per-key coalescing of concurrent loads.
//!
//! The first caller for a key becomes the leader and runs the load; every
//! concurrent caller for the same key becomes a follower and waits for the
//! leader's result. The leader publishes `(value, error)` into the flight
//! slot *before* waking followers; the flight mutex orders the write
//! ahead of any follower's read, so a woken follower always observes the
//! final result.
//!
//! Cancelling a follower's [`Context`] releases only that follower; the
//! leader keeps running and its result still serves the remaining waiters.
//! Followers re-check cancellation between bounded condvar waits (the
//! sync-land stand-in for selecting on two wake sources), so a cancelled
//! follower returns within roughly one wait slice.
//!
//! The group mutex is held only across flight-map lookups and
//! insert/remove, never across the load itself.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;

use crate::context::Context;
use crate::error::LoadError;

/// Upper bound on how long a follower sleeps before re-checking its
/// context. Only paid while a load is in flight.
const WAIT_SLICE: Duration = Duration::from_millis(1);

#[derive(Debug)]
struct Flight<V> {
    slot: Mutex<Option<Result<V, LoadError>>>,
    done: Condvar,
}

/// Coalesces concurrent `run` calls per key so the load executes at most
/// once per in-flight window.
#[derive(Debug)]
pub(crate) struct Group<K, V> {
    flights: Mutex<FxHashMap<K, Arc<Flight<V>>>>,
}

impl<K, V> Group<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            flights: Mutex::new(FxHashMap::default()),
        }
    }

    /// Runs `load` once for `key`; concurrent callers share the result.
    ///
    /// If `ctx` is cancelled while waiting on another caller's load, only
    /// this caller returns early (with the cancellation error).
    pub(crate) fn run(
        &self,
        ctx: &Context,
        key: &K,
        load: impl FnOnce() -> Result<V, LoadError>,
    ) -> Result<V, LoadError> {
        let flight = {
            let mut flights = self.flights.lock();
            if let Some(flight) = flights.get(key) {
                let flight = Arc::clone(flight);
                drop(flights);
                return Self::wait(ctx, &flight);
            }
            let flight = Arc::new(Flight {
                slot: Mutex::new(None),
                done: Condvar::new(),
            });
            flights.insert(key.clone(), Arc::clone(&flight));
            flight
        };

        // Leader: run the load without any lock held.
        let result = load();

        {
            // Publish, then wake. Followers that already hold an Arc to
            // this flight read the slot even after the marker is gone.
            let mut slot = flight.slot.lock();
            *slot = Some(result.clone());
            flight.done.notify_all();
        }
        self.flights.lock().remove(key);

        result
    }

    /// Returns the number of in-flight keys (for tests).
    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.flights.lock().len()
    }

    fn wait(ctx: &Context, flight: &Flight<V>) -> Result<V, LoadError> {
        let mut slot = flight.slot.lock();
        loop {
            if let Some(result) = slot.as_ref() {
                return result.clone();
            }
            if let Some(err) = ctx.done_err() {
                return Err(err);
            }
            let _ = flight.done.wait_for(&mut slot, WAIT_SLICE);
        }
    }
}
