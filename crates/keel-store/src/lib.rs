//! # keel-store
//!
//! Immutable-snapshot state store for the keel runtime.
//!
//! State lives in `Arc<serde_json::Value>` snapshots and only changes
//! through dispatched actions: middleware may veto, a reducer computes
//! the next snapshot, and subscribers are notified of the transition.
//! History retains past snapshots for undo.
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`StateStore`] | Dispatch, subscriptions, history, undo/reset |
//! | [`Action`] / [`kinds`] | What happened, with built-in kinds |
//! | [`Reducer`] | Pure `(state, action) -> Option<state>` |
//! | [`Selector`] | Snapshot-memoized derived views |
//! | [`DispatchOutcome`] | Committed / Vetoed / Unchanged |
//!
//! ## Quick Start
//!
//! ```
//! use keel_store::{kinds, StateStore, StoreOptions};
//! use serde_json::json;
//!
//! let store = StateStore::new(json!({"user": {"name": "ada"}}), StoreOptions::default());
//!
//! store.watch("user.name", |new, old| {
//!     println!("renamed {old:?} -> {new:?}");
//! });
//!
//! store.dispatch(
//!     kinds::SET_PROPERTY,
//!     json!({"path": "user.name", "value": "grace"}),
//! );
//! assert_eq!(store.state_at("user.name"), Some(json!("grace")));
//!
//! store.undo();
//! assert_eq!(store.state_at("user.name"), Some(json!("ada")));
//! ```

pub mod action;
pub mod reducer;
pub mod selector;
pub mod store;

pub use action::{kinds, Action, ActionRecord, DispatchOutcome};
pub use reducer::{reduce_builtin, DefaultReducer, Reducer};
pub use selector::Selector;
pub use store::{FilterFn, Listener, StateStore, StoreMiddleware, StoreOptions, SubscribeOptions};
