//! In-flight request deduplication.
//!
//! At most one operation per [`RequestSignature`] runs at a time. Later
//! callers with the same signature await the same shared future and get a
//! clone of its outcome, error included. The registry entry is removed the
//! moment the operation completes, and also when every waiter has gone away
//! before it did.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::debug;

use reelscroll_core::{Error, RequestSignature, Result};

type SharedOutcome<T> = Shared<BoxFuture<'static, Result<T>>>;
type Registry<T> = Arc<Mutex<HashMap<RequestSignature, SharedOutcome<T>>>>;

/// Registry of in-flight operations.
pub struct Deduplicator<T> {
    pending: Registry<T>,
}

impl<T> Default for Deduplicator<T> {
    fn default() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Deduplicator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `factory` unless an operation with `signature` is already in
    /// flight, in which case wait for that one instead.
    pub async fn dedupe<F, Fut>(&self, signature: &RequestSignature, factory: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let shared = {
            let mut pending = lock(&self.pending);
            match pending.get(signature) {
                Some(existing) => {
                    debug!(
                        subsystem = "engine",
                        component = "dedup",
                        signature = %signature,
                        "Joining in-flight request"
                    );
                    existing.clone()
                }
                None => {
                    let registry = Arc::clone(&self.pending);
                    let key = signature.clone();
                    let operation = factory();
                    let shared = async move {
                        let outcome = operation.await;
                        lock(&registry).remove(&key);
                        outcome
                    }
                    .boxed()
                    .shared();
                    pending.insert(signature.clone(), shared.clone());
                    shared
                }
            }
        };

        let mut waiter = Waiter {
            registry: Arc::clone(&self.pending),
            signature: signature.clone(),
            shared: Some(shared),
        };
        waiter.wait().await
    }

    /// Number of operations currently in flight.
    pub fn in_flight(&self) -> usize {
        lock(&self.pending).len()
    }
}

/// One caller's interest in a shared operation.
///
/// Dropping the last waiter of an unfinished operation drops the operation
/// and clears its registry entry, so an abandoned request never blocks the
/// next attempt.
struct Waiter<T: Clone> {
    registry: Registry<T>,
    signature: RequestSignature,
    shared: Option<SharedOutcome<T>>,
}

impl<T: Clone> Waiter<T> {
    async fn wait(&mut self) -> Result<T> {
        match self.shared.as_mut() {
            Some(shared) => shared.await,
            None => Err(Error::Internal("dedup waiter already consumed".into())),
        }
    }
}

impl<T: Clone> Drop for Waiter<T> {
    fn drop(&mut self) {
        let Some(shared) = self.shared.take() else {
            return;
        };
        let finished = shared.peek().is_some();
        drop(shared);
        if finished {
            return;
        }

        let mut pending = lock(&self.registry);
        let abandoned = pending
            .get(&self.signature)
            .is_some_and(|entry| entry.strong_count() == Some(1));
        if abandoned {
            pending.remove(&self.signature);
            debug!(
                subsystem = "engine",
                component = "dedup",
                signature = %self.signature,
                "Dropped abandoned in-flight request"
            );
        }
    }
}

fn lock<T>(registry: &Mutex<T>) -> MutexGuard<'_, T> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}
