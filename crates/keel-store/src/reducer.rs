//! Reducers - pure `(state, action) -> new state` functions.

use crate::action::{kinds, Action};
use keel_types::{get_path, merge_deep, merge_shallow, set_path};
use serde_json::Value;

/// Computes the next state for an action.
///
/// Returning `None` means "no change": the store keeps the current
/// snapshot and skips subscriber notification entirely. The default
/// implementation delegates to [`reduce_builtin`]; custom reducers
/// usually handle their own kinds first and fall back to it:
///
/// ```
/// use keel_store::{reduce_builtin, Action, Reducer};
/// use serde_json::{json, Value};
///
/// struct CounterReducer;
///
/// impl Reducer for CounterReducer {
///     fn reduce(&self, state: &Value, action: &Action) -> Option<Value> {
///         match action.kind.as_str() {
///             "INCREMENT" => {
///                 let n = state.get("count").and_then(Value::as_i64).unwrap_or(0);
///                 Some(json!({"count": n + 1}))
///             }
///             _ => reduce_builtin(state, action),
///         }
///     }
/// }
/// ```
pub trait Reducer: Send + Sync {
    /// Returns the next state, or `None` when the action changes
    /// nothing.
    fn reduce(&self, state: &Value, action: &Action) -> Option<Value> {
        reduce_builtin(state, action)
    }
}

/// Reducer handling only the built-in kinds.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultReducer;

impl Reducer for DefaultReducer {}

/// The built-in reductions: `SET_STATE` (shallow merge),
/// `SET_PROPERTY` (dotted-path write), `MERGE_STATE` (deep merge).
///
/// All three are no-change aware: writing a value that is already
/// there yields `None`, so subscribers are not woken for identical
/// states. Unknown kinds reduce to `None`.
pub fn reduce_builtin(state: &Value, action: &Action) -> Option<Value> {
    match action.kind.as_str() {
        kinds::SET_STATE => {
            let next = merge_shallow(state, &action.payload);
            if next == *state {
                None
            } else {
                Some(next)
            }
        }
        kinds::SET_PROPERTY => {
            let path = action.payload.get("path")?.as_str()?;
            let value = action.payload.get("value").cloned().unwrap_or(Value::Null);
            if get_path(state, path) == Some(&value) {
                return None;
            }
            Some(set_path(state, path, value))
        }
        kinds::MERGE_STATE => {
            let next = merge_deep(state, &action.payload);
            if next == *state {
                None
            } else {
                Some(next)
            }
        }
        _ => {
            tracing::debug!(kind = %action.kind, "no built-in reduction for action kind");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn act(kind: &str, payload: Value) -> Action {
        Action::new(kind, payload)
    }

    #[test]
    fn set_state_shallow_merges() {
        let state = json!({"a": {"x": 1}, "b": 2});
        let next = reduce_builtin(&state, &act(kinds::SET_STATE, json!({"a": {"y": 9}}))).unwrap();
        assert_eq!(next, json!({"a": {"y": 9}, "b": 2}));
    }

    #[test]
    fn set_state_identical_payload_is_no_change() {
        let state = json!({"a": 1});
        assert!(reduce_builtin(&state, &act(kinds::SET_STATE, json!({"a": 1}))).is_none());
    }

    #[test]
    fn set_property_writes_a_path() {
        let state = json!({"user": {"name": "ada"}});
        let next = reduce_builtin(
            &state,
            &act(kinds::SET_PROPERTY, json!({"path": "user.name", "value": "grace"})),
        )
        .unwrap();
        assert_eq!(next, json!({"user": {"name": "grace"}}));
    }

    #[test]
    fn set_property_equal_value_is_no_change() {
        let state = json!({"user": {"name": "ada"}});
        let action = act(kinds::SET_PROPERTY, json!({"path": "user.name", "value": "ada"}));
        assert!(reduce_builtin(&state, &action).is_none());
    }

    #[test]
    fn set_property_without_path_is_no_change() {
        let state = json!({});
        assert!(reduce_builtin(&state, &act(kinds::SET_PROPERTY, json!({"value": 1}))).is_none());
    }

    #[test]
    fn merge_state_is_deep() {
        let state = json!({"ui": {"theme": "dark", "zoom": 1}});
        let next =
            reduce_builtin(&state, &act(kinds::MERGE_STATE, json!({"ui": {"zoom": 2}}))).unwrap();
        assert_eq!(next, json!({"ui": {"theme": "dark", "zoom": 2}}));
    }

    #[test]
    fn unknown_kind_is_no_change() {
        let state = json!({"a": 1});
        assert!(reduce_builtin(&state, &act("custom:noop", json!({}))).is_none());
    }
}
