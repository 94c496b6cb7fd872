//! Coalescing of concurrent invocations into one running operation.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, Shared};

type Flight<T> = Shared<BoxFuture<'static, T>>;
type Slot<T> = Arc<Mutex<Option<Flight<T>>>>;

/// Empties the slot when dropped, including while a panicking operation
/// unwinds. Otherwise later callers would join a poisoned flight.
struct Release<T: Clone + Send + Sync + 'static> {
    slot: Slot<T>,
}

impl<T: Clone + Send + Sync + 'static> Drop for Release<T> {
    fn drop(&mut self) {
        *SingleFlight::<T>::lock(&self.slot) = None;
    }
}

/// Runs at most one operation at a time. Callers arriving while it runs
/// await the same operation and receive a clone of its output.
pub struct SingleFlight<T: Clone + Send + Sync + 'static> {
    slot: Slot<T>,
}

impl<T: Clone + Send + Sync + 'static> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync + 'static> SingleFlight<T> {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    fn lock(slot: &Mutex<Option<Flight<T>>>) -> MutexGuard<'_, Option<Flight<T>>> {
        slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether an operation is in flight.
    pub fn is_running(&self) -> bool {
        Self::lock(&self.slot).is_some()
    }

    /// Join the running operation, or start one with `start`.
    ///
    /// `start` is only called when nothing is in flight. The slot is released
    /// when the operation completes, before any caller observes its output.
    /// If the operation panics, the callers awaiting it panic too, but the
    /// slot is still released and the next call starts a fresh operation.
    pub async fn run<F, Fut>(&self, start: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let flight = {
            let mut slot = Self::lock(&self.slot);
            match slot.as_ref() {
                Some(flight) => flight.clone(),
                None => {
                    let operation = start();
                    let release = Release {
                        slot: Arc::clone(&self.slot),
                    };
                    let flight = async move {
                        let _release = release;
                        operation.await
                    }
                    .boxed()
                    .shared();
                    *slot = Some(flight.clone());
                    flight
                }
            }
        };
        flight.await
    }
}
