//! Operation deduplication tracker
//!
//! Guarantees at most one in-flight execution per operation key. The first
//! caller registers a shared future and runs it; concurrent callers arriving
//! under the same key await that same future and observe the identical
//! outcome, success or failure, without re-executing anything. The registry
//! entry is removed once the operation settles.
//!
//! The registry mutex guards only the map; it is never held across an await,
//! so distinct keys run fully concurrently.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::info;

pub struct OperationTracker<T: Clone> {
    pending: Mutex<HashMap<String, Shared<BoxFuture<'static, T>>>>,
}

impl<T> OperationTracker<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Run `operation` under `key`, or await the in-flight execution already
    /// registered under it.
    ///
    /// No timeout of its own: a stuck operation blocks all duplicate callers
    /// until it settles, which is why on-ledger waits are bounded upstream.
    pub async fn track<F>(&self, key: &str, operation: F) -> T
    where
        F: Future<Output = T> + Send + 'static,
    {
        let (shared, is_owner) = {
            let mut pending = self.pending.lock().expect("tracker registry lock poisoned");
            match pending.entry(key.to_string()) {
                Entry::Occupied(entry) => {
                    info!(
                        operation_key = %key,
                        "Duplicate operation detected, awaiting in-flight result"
                    );
                    (entry.get().clone(), false)
                }
                Entry::Vacant(slot) => {
                    let shared = operation.boxed().shared();
                    slot.insert(shared.clone());
                    (shared, true)
                }
            }
        };

        let result = shared.await;

        // Only the registering caller removes the entry; duplicate waiters
        // must not race a newer registration under the same key.
        if is_owner {
            self.pending
                .lock()
                .expect("tracker registry lock poisoned")
                .remove(key);
        }

        result
    }

    /// Number of operations currently in flight.
    pub fn in_flight(&self) -> usize {
        self.pending
            .lock()
            .expect("tracker registry lock poisoned")
            .len()
    }
}

impl<T> Default for OperationTracker<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
