//! StateStore - dispatch, snapshots, history, subscriptions.
//!
//! ```text
//! dispatch(kind, payload)
//!     │
//!     ▼ middleware chain (sequential; None vetoes the action)
//!     ▼ reducer: (state, action) -> Option<new state>
//!     │      None ──▶ Unchanged, nobody notified
//!     ▼
//! commit: swap in Arc<new state>, append history + action log
//!     │
//!     ▼ notify qualifying subscribers with (new, prev, action)
//! ```
//!
//! # Immutability
//!
//! State is held as `Arc<Value>` snapshots. A commit swaps the Arc;
//! readers holding an old snapshot keep a fully consistent view, and
//! history/undo are just a deque of those Arcs. Nothing is ever
//! mutated in place.
//!
//! # Concurrency
//!
//! The whole dispatch pipeline (middleware, reducer, commit,
//! subscriber qualification) runs under one mutex, so concurrent
//! dispatches are serialized and every subscriber sees each transition
//! exactly once, in commit order. Listener callbacks run *after* the
//! lock is released, so a listener may dispatch again without
//! deadlocking.

use crate::action::{kinds, Action, ActionRecord, DispatchOutcome};
use crate::reducer::{DefaultReducer, Reducer};
use crate::selector::Selector;
use keel_types::{get_path, SubscriptionId};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;

/// Ring-buffer cap on the action log.
const ACTION_LOG_CAP: usize = 100;

/// Store construction options.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Keep snapshot history for [`undo`](StateStore::undo). Default
    /// `true`.
    pub enable_history: bool,
    /// Maximum retained snapshots, current state included. Default
    /// `50`.
    pub max_history_size: usize,
    /// Log every dispatch at debug level. Default `false`.
    pub debug: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            enable_history: true,
            max_history_size: 50,
            debug: false,
        }
    }
}

/// Predicate deciding whether a subscriber fires, given the action and
/// the new and previous states.
pub type FilterFn = Arc<dyn Fn(&Action, &Value, &Value) -> bool + Send + Sync>;

/// Subscriber callback: `(new_state, previous_state, action)`.
pub type Listener = Arc<dyn Fn(&Value, &Value, &Action) + Send + Sync>;

/// Middleware: inspect or rewrite an action before it reaches the
/// reducer. Returning `None` vetoes the dispatch.
pub type StoreMiddleware = Arc<dyn Fn(&Value, &Action) -> Option<Action> + Send + Sync>;

/// Options for [`StateStore::subscribe`].
#[derive(Clone)]
pub struct SubscribeOptions {
    /// Invoke the listener immediately with the current state (as both
    /// new and previous, under an `@@INIT` action). Default `true`.
    pub immediate: bool,
    /// Only fire when the value at this dotted path changed.
    pub path: Option<String>,
    /// Only fire when this predicate passes on
    /// `(action, new_state, previous_state)`.
    pub filter: Option<FilterFn>,
    /// Remove the subscription after its first real notification
    /// (immediate callbacks do not count).
    pub once: bool,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self {
            immediate: true,
            path: None,
            filter: None,
            once: false,
        }
    }
}

impl SubscribeOptions {
    /// Options scoped to one dotted path, without the immediate call.
    #[must_use]
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            immediate: false,
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Adds a qualification predicate.
    #[must_use]
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Action, &Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }
}

struct SubEntry {
    id: SubscriptionId,
    listener: Listener,
    path: Option<String>,
    filter: Option<FilterFn>,
    once: bool,
}

struct StoreInner {
    state: Arc<Value>,
    /// Snapshot history, oldest first; always ends with the current
    /// state when history is enabled.
    history: VecDeque<Arc<Value>>,
    actions: VecDeque<ActionRecord>,
    subscribers: Vec<SubEntry>,
    middleware: Vec<StoreMiddleware>,
}

type Notification = (Listener, Arc<Value>, Arc<Value>, Action);

/// Immutable-snapshot state store.
pub struct StateStore {
    inner: Mutex<StoreInner>,
    options: StoreOptions,
    reducer: Box<dyn Reducer>,
}

impl StateStore {
    /// Creates a store over an initial state with the default reducer.
    #[must_use]
    pub fn new(initial: Value, options: StoreOptions) -> Self {
        Self::with_reducer(initial, options, Box::new(DefaultReducer))
    }

    /// Creates a store with a custom reducer.
    #[must_use]
    pub fn with_reducer(initial: Value, options: StoreOptions, reducer: Box<dyn Reducer>) -> Self {
        let state = Arc::new(initial);
        let mut history = VecDeque::new();
        if options.enable_history {
            history.push_back(Arc::clone(&state));
        }
        Self {
            inner: Mutex::new(StoreInner {
                state,
                history,
                actions: VecDeque::new(),
                subscribers: Vec::new(),
                middleware: Vec::new(),
            }),
            options,
            reducer,
        }
    }

    /// Returns the current state snapshot.
    #[must_use]
    pub fn state(&self) -> Arc<Value> {
        Arc::clone(&self.inner.lock().state)
    }

    /// Returns a clone of the value at a dotted path, if present.
    #[must_use]
    pub fn state_at(&self, path: &str) -> Option<Value> {
        get_path(&self.inner.lock().state, path).cloned()
    }

    /// Dispatches an action through middleware and the reducer.
    ///
    /// The pipeline is serialized: overlapping dispatches from other
    /// threads queue up and commit one at a time. Subscribers are
    /// invoked after the commit, outside the store lock.
    pub fn dispatch(&self, kind: impl Into<String>, payload: Value) -> DispatchOutcome {
        let mut action = Action::new(kind.into(), payload);

        let notifications = {
            let mut inner = self.inner.lock();

            let middleware = inner.middleware.clone();
            for mw in &middleware {
                match mw(&inner.state, &action) {
                    Some(next) => action = next,
                    None => {
                        tracing::debug!(kind = %action.kind, "dispatch vetoed by middleware");
                        return DispatchOutcome::Vetoed;
                    }
                }
            }

            let Some(next) = self.reducer.reduce(&inner.state, &action) else {
                if self.options.debug {
                    tracing::debug!(kind = %action.kind, "dispatch produced no change");
                }
                return DispatchOutcome::Unchanged;
            };

            let before = Arc::clone(&inner.state);
            let after = Arc::new(next);
            inner.state = Arc::clone(&after);

            if self.options.enable_history {
                inner.history.push_back(Arc::clone(&after));
                while inner.history.len() > self.options.max_history_size {
                    inner.history.pop_front();
                }
            }

            inner.actions.push_back(ActionRecord {
                action: action.clone(),
                before: Arc::clone(&before),
                after: Arc::clone(&after),
            });
            while inner.actions.len() > ACTION_LOG_CAP {
                inner.actions.pop_front();
            }

            if self.options.debug {
                tracing::debug!(kind = %action.kind, id = %action.id, "dispatch committed");
            }

            collect_notifications(&mut inner, &before, &after, &action)
        };

        for (listener, new, prev, action) in notifications {
            listener(&new, &prev, &action);
        }
        DispatchOutcome::Committed
    }

    /// Appends an action middleware.
    ///
    /// Middleware run in registration order on every dispatch. Each
    /// may pass the action on (possibly rewritten) or return `None` to
    /// veto it, which short-circuits the rest of the chain.
    pub fn add_middleware<F>(&self, middleware: F)
    where
        F: Fn(&Value, &Action) -> Option<Action> + Send + Sync + 'static,
    {
        self.inner.lock().middleware.push(Arc::new(middleware));
    }

    /// Subscribes a listener to state transitions.
    ///
    /// Qualification per commit: the subscriber's path (if any) must
    /// have changed between the snapshots, and its filter (if any)
    /// must pass on the new state.
    pub fn subscribe<F>(&self, listener: F, options: SubscribeOptions) -> SubscriptionId
    where
        F: Fn(&Value, &Value, &Action) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        let listener: Listener = Arc::new(listener);

        let immediate = {
            let mut inner = self.inner.lock();
            inner.subscribers.push(SubEntry {
                id,
                listener: Arc::clone(&listener),
                path: options.path,
                filter: options.filter,
                once: options.once,
            });
            options.immediate.then(|| Arc::clone(&inner.state))
        };

        if let Some(state) = immediate {
            let action = Action::new(kinds::INIT, Value::Null);
            listener(&state, &state, &action);
        }
        id
    }

    /// Convenience: watch one dotted path, receiving the old and new
    /// values at that path.
    pub fn watch<F>(&self, path: impl Into<String>, callback: F) -> SubscriptionId
    where
        F: Fn(Option<&Value>, Option<&Value>) + Send + Sync + 'static,
    {
        let path = path.into();
        let lookup = path.clone();
        self.subscribe(
            move |new, prev, _action| {
                callback(get_path(new, &lookup), get_path(prev, &lookup));
            },
            SubscribeOptions::path(path),
        )
    }

    /// Removes a subscription. Unknown ids are a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.lock();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|entry| entry.id != id);
        inner.subscribers.len() != before
    }

    /// Returns the number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    /// Restores the previous snapshot.
    ///
    /// Returns `false` when history is disabled or there is nothing to
    /// undo. Subscribers are notified under a synthesized `UNDO`
    /// action; the action log is left untouched, so undo itself never
    /// appears in it.
    pub fn undo(&self) -> bool {
        let notifications = {
            let mut inner = self.inner.lock();
            if !self.options.enable_history || inner.history.len() < 2 {
                return false;
            }
            inner.history.pop_back();
            let Some(restored) = inner.history.back().cloned() else {
                return false;
            };
            let before = std::mem::replace(&mut inner.state, Arc::clone(&restored));
            let action = Action::new(kinds::UNDO, Value::Null);
            collect_notifications(&mut inner, &before, &restored, &action)
        };

        for (listener, new, prev, action) in notifications {
            listener(&new, &prev, &action);
        }
        true
    }

    /// Replaces the state wholesale.
    ///
    /// With `Some(state)` that becomes the new root; with `None` the
    /// oldest retained snapshot is restored. History is reseeded with
    /// the result and the action log is cleared. Subscribers are
    /// notified under a synthesized `RESET` action.
    pub fn reset(&self, state: Option<Value>) {
        let notifications = {
            let mut inner = self.inner.lock();
            let target = match state {
                Some(value) => Arc::new(value),
                None => inner
                    .history
                    .front()
                    .cloned()
                    .unwrap_or_else(|| Arc::clone(&inner.state)),
            };
            let before = std::mem::replace(&mut inner.state, Arc::clone(&target));
            inner.actions.clear();
            if self.options.enable_history {
                inner.history.clear();
                inner.history.push_back(Arc::clone(&target));
            }
            let action = Action::new(kinds::RESET, Value::Null);
            collect_notifications(&mut inner, &before, &target, &action)
        };

        for (listener, new, prev, action) in notifications {
            listener(&new, &prev, &action);
        }
    }

    /// Creates a memoized [`Selector`] over this store's snapshots.
    ///
    /// Equivalent to [`Selector::new`]; the derivation re-runs only
    /// when the store commits a new snapshot.
    #[must_use]
    pub fn create_selector<R, F>(&self, derive: F) -> Selector<R>
    where
        F: Fn(&Value) -> R + Send + Sync + 'static,
    {
        Selector::new(derive)
    }

    /// Returns the action log, oldest first (at most 100 entries).
    #[must_use]
    pub fn action_history(&self) -> Vec<ActionRecord> {
        self.inner.lock().actions.iter().cloned().collect()
    }

    /// Returns how many snapshots history currently retains.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.inner.lock().history.len()
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("StateStore")
            .field("history_len", &inner.history.len())
            .field("subscribers", &inner.subscribers.len())
            .field("options", &self.options)
            .finish()
    }
}

/// Decides, under the lock, which subscribers a transition reaches,
/// and prunes fired `once` entries. The actual callbacks run after the
/// lock is dropped.
fn collect_notifications(
    inner: &mut StoreInner,
    before: &Arc<Value>,
    after: &Arc<Value>,
    action: &Action,
) -> Vec<Notification> {
    let mut fired = Vec::new();
    let mut fired_once = Vec::new();

    for entry in &inner.subscribers {
        let changed = match &entry.path {
            Some(path) => get_path(before, path) != get_path(after, path),
            None => true,
        };
        if !changed {
            continue;
        }
        if let Some(filter) = &entry.filter {
            if !filter(action, after, before) {
                continue;
            }
        }
        fired.push((
            Arc::clone(&entry.listener),
            Arc::clone(after),
            Arc::clone(before),
            action.clone(),
        ));
        if entry.once {
            fired_once.push(entry.id);
        }
    }

    if !fired_once.is_empty() {
        inner
            .subscribers
            .retain(|entry| !fired_once.contains(&entry.id));
    }
    fired
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store(initial: Value) -> StateStore {
        StateStore::new(initial, StoreOptions::default())
    }

    fn set_property(store: &StateStore, path: &str, value: Value) -> DispatchOutcome {
        store.dispatch(kinds::SET_PROPERTY, json!({"path": path, "value": value}))
    }

    #[test]
    fn dispatch_commits_and_keeps_old_snapshot_intact() {
        let store = store(json!({"user": {"name": "ada"}}));
        let before = store.state();

        let outcome = set_property(&store, "user.name", json!("grace"));

        assert_eq!(outcome, DispatchOutcome::Committed);
        assert_eq!(store.state_at("user.name"), Some(json!("grace")));
        // the pre-dispatch snapshot is untouched
        assert_eq!(get_path(&before, "user.name"), Some(&json!("ada")));
    }

    #[test]
    fn identical_write_is_unchanged_and_silent() {
        let store = store(json!({"n": 1}));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        store.subscribe(
            move |_, _, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            SubscribeOptions {
                immediate: false,
                ..SubscribeOptions::default()
            },
        );

        assert_eq!(set_property(&store, "n", json!(1)), DispatchOutcome::Unchanged);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn middleware_can_veto() {
        let store = store(json!({"locked": true, "n": 0}));
        store.add_middleware(|state, action| {
            let locked = state.get("locked").and_then(Value::as_bool).unwrap_or(false);
            if locked && action.kind == kinds::SET_PROPERTY {
                None
            } else {
                Some(action.clone())
            }
        });

        assert_eq!(set_property(&store, "n", json!(5)), DispatchOutcome::Vetoed);
        assert_eq!(store.state_at("n"), Some(json!(0)));
        assert!(store.action_history().is_empty());
    }

    #[test]
    fn middleware_can_rewrite_the_action() {
        let store = store(json!({"tagged": null}));
        store.add_middleware(|_state, action| {
            let mut rewritten = action.clone();
            if rewritten.kind == kinds::SET_PROPERTY {
                rewritten.payload["value"] = json!("stamped");
            }
            Some(rewritten)
        });

        set_property(&store, "tagged", json!("original"));
        assert_eq!(store.state_at("tagged"), Some(json!("stamped")));
    }

    #[test]
    fn history_is_capped() {
        let store = StateStore::new(
            json!({"n": 0}),
            StoreOptions {
                max_history_size: 2,
                ..StoreOptions::default()
            },
        );

        for n in 1..=3 {
            set_property(&store, "n", json!(n));
        }

        assert_eq!(store.history_len(), 2);
        // undo can only reach the newest retained predecessor
        assert!(store.undo());
        assert_eq!(store.state_at("n"), Some(json!(2)));
        assert!(!store.undo());
    }

    #[test]
    fn undo_restores_and_notifies() {
        let store = store(json!({"n": 0}));
        set_property(&store, "n", json!(1));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(
            move |new, _prev, action| {
                sink.lock().push((action.kind.clone(), new.clone()));
            },
            SubscribeOptions {
                immediate: false,
                ..SubscribeOptions::default()
            },
        );

        assert!(store.undo());
        assert_eq!(store.state_at("n"), Some(json!(0)));
        assert_eq!(*seen.lock(), vec![(kinds::UNDO.to_string(), json!({"n": 0}))]);
    }

    #[test]
    fn undo_without_history_is_refused() {
        let store = StateStore::new(
            json!({"n": 0}),
            StoreOptions {
                enable_history: false,
                ..StoreOptions::default()
            },
        );
        set_property(&store, "n", json!(1));
        assert!(!store.undo());
        assert_eq!(store.state_at("n"), Some(json!(1)));
    }

    #[test]
    fn reset_restores_the_initial_snapshot() {
        let store = store(json!({"n": 0}));
        set_property(&store, "n", json!(1));
        set_property(&store, "n", json!(2));

        store.reset(None);

        assert_eq!(store.state_at("n"), Some(json!(0)));
        assert_eq!(store.history_len(), 1);
        assert!(store.action_history().is_empty());
    }

    #[test]
    fn reset_to_explicit_state() {
        let store = store(json!({"n": 0}));
        store.reset(Some(json!({"n": 99})));
        assert_eq!(store.state_at("n"), Some(json!(99)));
    }

    #[test]
    fn watch_fires_only_when_the_path_changes() {
        let store = store(json!({"a": 1, "b": 1}));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        store.watch("a", move |new, old| {
            sink.lock().push((old.cloned(), new.cloned()));
        });

        set_property(&store, "b", json!(2)); // unrelated
        set_property(&store, "a", json!(5));

        assert_eq!(*calls.lock(), vec![(Some(json!(1)), Some(json!(5)))]);
    }

    #[test]
    fn immediate_subscription_sees_current_state_without_consuming_once() {
        let store = store(json!({"n": 7}));
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        store.subscribe(
            move |new, _prev, action| {
                sink.lock().push((action.kind.clone(), new["n"].clone()));
            },
            SubscribeOptions {
                once: true,
                ..SubscribeOptions::default()
            },
        );

        set_property(&store, "n", json!(8));
        set_property(&store, "n", json!(9)); // once already consumed

        assert_eq!(
            *calls.lock(),
            vec![
                (kinds::INIT.to_string(), json!(7)),
                (kinds::SET_PROPERTY.to_string(), json!(8)),
            ]
        );
    }

    #[test]
    fn filter_gates_notification() {
        let store = store(json!({"n": 0}));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        store.subscribe(
            move |_, _, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            SubscribeOptions {
                immediate: false,
                ..SubscribeOptions::default()
            }
            .with_filter(|_action, new, _prev| new["n"].as_i64().unwrap_or(0) > 5),
        );

        set_property(&store, "n", json!(3));
        set_property(&store, "n", json!(7));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listener_may_dispatch_without_deadlock() {
        let store = Arc::new(store(json!({"n": 0, "echo": 0})));
        let echo_store = Arc::clone(&store);
        store.subscribe(
            move |new, _prev, action| {
                if action.kind == kinds::SET_PROPERTY && new["echo"] == json!(0) {
                    echo_store.dispatch(
                        kinds::SET_PROPERTY,
                        json!({"path": "echo", "value": 1}),
                    );
                }
            },
            SubscribeOptions {
                immediate: false,
                path: Some("n".into()),
                ..SubscribeOptions::default()
            },
        );

        set_property(&store, "n", json!(1));
        assert_eq!(store.state_at("echo"), Some(json!(1)));
    }

    #[test]
    fn action_log_records_transitions_and_caps_at_100() {
        let store = store(json!({"n": 0}));
        for n in 1..=105 {
            set_property(&store, "n", json!(n));
        }

        let log = store.action_history();
        assert_eq!(log.len(), 100);
        assert_eq!(log[0].action.kind, kinds::SET_PROPERTY);
        assert_eq!(get_path(&log[99].after, "n"), Some(&json!(105)));
        assert_eq!(get_path(&log[99].before, "n"), Some(&json!(104)));
    }

    #[test]
    fn create_selector_tracks_commits() {
        let store = store(json!({"n": 2}));
        let doubled = store.create_selector(|state: &Value| state["n"].as_i64().unwrap_or(0) * 2);

        let a = doubled.select(&store);
        let b = doubled.select(&store);
        assert_eq!(*a, 4);
        assert!(Arc::ptr_eq(&a, &b));

        set_property(&store, "n", json!(5));
        assert_eq!(*doubled.select(&store), 10);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let store = store(json!({"n": 0}));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let id = store.subscribe(
            move |_, _, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
            SubscribeOptions {
                immediate: false,
                ..SubscribeOptions::default()
            },
        );

        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        set_property(&store, "n", json!(1));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
