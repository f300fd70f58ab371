//! Actions - the only way state changes.

use keel_types::ActionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::SystemTime;

/// Built-in action kinds.
///
/// The default reducer understands the first three; `UNDO`, `RESET`
/// and `INIT` are synthesized by the store itself and only ever reach
/// subscribers, never the reducer.
pub mod kinds {
    /// Shallow-merge the payload object into the state root.
    pub const SET_STATE: &str = "SET_STATE";
    /// Set one dotted path: payload `{"path": "a.b", "value": ...}`.
    pub const SET_PROPERTY: &str = "SET_PROPERTY";
    /// Deep-merge the payload object into the state tree.
    pub const MERGE_STATE: &str = "MERGE_STATE";
    /// Synthesized when [`undo`](crate::StateStore::undo) restores a
    /// snapshot.
    pub const UNDO: &str = "UNDO";
    /// Synthesized when [`reset`](crate::StateStore::reset) replaces
    /// the state.
    pub const RESET: &str = "RESET";
    /// Synthesized for immediate subscription callbacks.
    pub const INIT: &str = "@@INIT";
}

/// A dispatched action: kind, payload, and provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Unique id, assigned at dispatch.
    pub id: ActionId,
    /// Action kind; see [`kinds`] for the built-ins.
    pub kind: String,
    /// Kind-specific payload.
    pub payload: Value,
    /// Wall-clock dispatch time.
    pub timestamp: SystemTime,
}

impl Action {
    /// Creates an action stamped with a fresh id and the current time.
    #[must_use]
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            id: ActionId::new(),
            kind: kind.into(),
            payload,
            timestamp: SystemTime::now(),
        }
    }
}

/// What a dispatch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The reducer produced a new state and subscribers were notified.
    Committed,
    /// A middleware cancelled the action; state is untouched.
    Vetoed,
    /// The reducer reported no change; state is untouched and nobody
    /// was notified.
    Unchanged,
}

/// One entry of the action log: the action plus the snapshots it moved
/// between.
#[derive(Debug, Clone)]
pub struct ActionRecord {
    /// The dispatched action.
    pub action: Action,
    /// State snapshot before the action.
    pub before: Arc<Value>,
    /// State snapshot after the action.
    pub after: Arc<Value>,
}
