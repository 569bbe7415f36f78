//! # Single-Flight Request Coalescing
//!
//! Proof generation takes seconds and verification touches the same
//! artifacts for every request about the same bundle. When several callers
//! ask for the same key concurrently, only the first runs the computation;
//! the rest await its result.
//!
//! A key is forgotten once its computation completes, so results are not
//! cached here. Callers that want caching put a cache in front.
//!
//! If the leader is cancelled mid-computation, the next waiter takes over
//! (`tokio::sync::OnceCell` semantics). A cancelled computation never
//! publishes a value. Every caller releases the key when it finishes or is
//! dropped, so an abandoned computation leaves no entry behind.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;

/// Coalesces concurrent computations that share a key.
#[derive(Debug)]
pub struct SingleFlight<K, V>
where
    K: Eq + Hash,
{
    calls: DashMap<K, Arc<OnceCell<V>>>,
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            calls: DashMap::new(),
        }
    }

    /// Run `f` for `key`, or join an in-flight run for the same key.
    pub async fn run<F, Fut>(&self, key: K, f: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let cell = self
            .calls
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();
        let _release = Release {
            calls: &self.calls,
            key: &key,
            cell: &cell,
        };
        let value = cell.get_or_init(f).await.clone();
        value
    }

    /// Number of keys with a computation in flight.
    pub fn in_flight(&self) -> usize {
        self.calls.len()
    }
}

/// Forgets `key` on drop, unless another run has already replaced its cell.
struct Release<'a, K, V>
where
    K: Eq + Hash,
{
    calls: &'a DashMap<K, Arc<OnceCell<V>>>,
    key: &'a K,
    cell: &'a Arc<OnceCell<V>>,
}

impl<K, V> Drop for Release<'_, K, V>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        self.calls
            .remove_if(self.key, |_, current| Arc::ptr_eq(current, self.cell));
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
