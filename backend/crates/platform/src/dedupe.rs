//! Request Deduplication
//!
//! Collapses concurrent identical requests into one execution. Every caller
//! that arrives while a key is in flight awaits the same shared future and
//! receives a clone of its output.
//!
//! The in-flight marker is cleared by whichever caller observes completion,
//! success or failure alike, so the next request for the key starts fresh.
//! Abandoning a caller does not cancel the shared work: the future stays
//! registered and the next caller for the key drives it to completion.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;

type InFlight<T> = Shared<BoxFuture<'static, T>>;

/// In-flight request registry keyed by request identity
pub struct RequestDeduplicator<T>
where
    T: Clone + Send + Sync + 'static,
{
    in_flight: DashMap<String, InFlight<T>>,
}

impl<T> Default for RequestDeduplicator<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RequestDeduplicator<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            in_flight: DashMap::new(),
        }
    }

    /// Run `factory` for `key` unless an identical request is already running
    ///
    /// `factory` is only invoked by the caller that registers the key.
    pub async fn dedupe<F, Fut>(&self, key: &str, factory: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let shared = match self.in_flight.entry(key.to_string()) {
            Entry::Occupied(existing) => {
                tracing::debug!(key = key, "Joining in-flight request");
                existing.get().clone()
            }
            Entry::Vacant(slot) => {
                let shared = factory().boxed().shared();
                slot.insert(shared.clone());
                shared
            }
        };

        let output = shared.clone().await;

        self.in_flight
            .remove_if(key, |_, registered| registered.ptr_eq(&shared));

        output
    }

    /// Stop handing the in-flight request for `key` to new callers
    ///
    /// Callers already awaiting it still receive its output; the next call
    /// for `key` starts a fresh execution.
    pub fn forget(&self, key: &str) -> bool {
        self.in_flight.remove(key).is_some()
    }

    /// Number of keys currently in flight
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}
