//! Memoized derived views over store state.

use crate::StateStore;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

/// A memoized selector: derives `R` from a state snapshot and caches
/// the result per snapshot.
///
/// The cache key is the snapshot's `Arc` identity, so selecting twice
/// against an unchanged store reuses the previous result without
/// re-running the derivation. Any commit swaps the state Arc and
/// naturally invalidates the cache.
///
/// # Example
///
/// ```
/// use keel_store::{Selector, StateStore, StoreOptions};
/// use serde_json::{json, Value};
///
/// let store = StateStore::new(json!({"items": [1, 2, 3]}), StoreOptions::default());
/// let total = Selector::new(|state: &Value| {
///     state["items"]
///         .as_array()
///         .map(|items| items.iter().filter_map(Value::as_i64).sum::<i64>())
///         .unwrap_or(0)
/// });
///
/// assert_eq!(*total.select(&store), 6);
/// ```
pub struct Selector<R> {
    derive: Box<dyn Fn(&Value) -> R + Send + Sync>,
    cache: Mutex<Option<(Arc<Value>, Arc<R>)>>,
}

impl<R> Selector<R> {
    /// Creates a selector from a pure derivation function.
    pub fn new<F>(derive: F) -> Self
    where
        F: Fn(&Value) -> R + Send + Sync + 'static,
    {
        Self {
            derive: Box::new(derive),
            cache: Mutex::new(None),
        }
    }

    /// Derives against the store's current snapshot, reusing the cache
    /// when the snapshot is unchanged.
    pub fn select(&self, store: &StateStore) -> Arc<R> {
        self.select_snapshot(&store.state())
    }

    /// Derives against an explicit snapshot.
    pub fn select_snapshot(&self, state: &Arc<Value>) -> Arc<R> {
        let mut cache = self.cache.lock();
        if let Some((cached_state, cached)) = cache.as_ref() {
            if Arc::ptr_eq(cached_state, state) {
                return Arc::clone(cached);
            }
        }
        let derived = Arc::new((self.derive)(state));
        *cache = Some((Arc::clone(state), Arc::clone(&derived)));
        derived
    }
}
