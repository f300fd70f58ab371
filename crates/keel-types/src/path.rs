//! Dotted-path utilities over [`serde_json::Value`].
//!
//! The store's state tree and each module's configuration are dynamic
//! JSON documents addressed with `"a.b.c"` style paths. These helpers
//! keep all path semantics in one place:
//!
//! - [`get_path`] - borrow the value at a path, `None` on any missing
//!   segment
//! - [`set_path`] - copy-on-write write: returns a *new* tree with the
//!   path set, creating intermediate objects as needed; the input is
//!   never mutated
//! - [`merge_shallow`] - top-level key merge of two objects
//! - [`merge_deep`] - recursive merge; objects merge key-wise, every
//!   other type is replaced by the patch value
//!
//! Numeric segments index into arrays (`"items.0.name"`).

use serde_json::{Map, Value};

/// Looks up a dotted path in a JSON tree.
///
/// Returns `None` if any segment is missing or the path descends into
/// a scalar. An empty path returns the root.
///
/// # Example
///
/// ```
/// use keel_types::get_path;
/// use serde_json::json;
///
/// let v = json!({"a": {"b": 5}, "items": [10, 20]});
/// assert_eq!(get_path(&v, "a.b"), Some(&json!(5)));
/// assert_eq!(get_path(&v, "items.1"), Some(&json!(20)));
/// assert_eq!(get_path(&v, "a.missing"), None);
/// ```
#[must_use]
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Returns a new tree with `path` set to `new_value`.
///
/// The input tree is left untouched; intermediate objects are created
/// for missing segments. Writing through a scalar or past the end of
/// an array replaces that position with a fresh object, mirroring the
/// "last writer wins" semantics of a dynamic state tree.
///
/// # Example
///
/// ```
/// use keel_types::{get_path, set_path};
/// use serde_json::json;
///
/// let before = json!({"a": {"b": 1}, "x": true});
/// let after = set_path(&before, "a.b", json!(2));
///
/// assert_eq!(get_path(&after, "a.b"), Some(&json!(2)));
/// // the original snapshot is unchanged
/// assert_eq!(get_path(&before, "a.b"), Some(&json!(1)));
/// // unrelated branches carry over
/// assert_eq!(get_path(&after, "x"), Some(&json!(true)));
/// ```
#[must_use]
pub fn set_path(value: &Value, path: &str, new_value: Value) -> Value {
    if path.is_empty() {
        return new_value;
    }
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };

    let replacement = match rest {
        None => new_value,
        Some(rest) => match child_of(value, head) {
            Some(child) => set_path(child, rest, new_value),
            None => set_path(&Value::Object(Map::new()), rest, new_value),
        },
    };

    match value {
        Value::Object(map) => {
            let mut map = map.clone();
            map.insert(head.to_string(), replacement);
            Value::Object(map)
        }
        Value::Array(items) => match head.parse::<usize>() {
            Ok(idx) if idx < items.len() => {
                let mut items = items.clone();
                items[idx] = replacement;
                Value::Array(items)
            }
            _ => single_key_object(head, replacement),
        },
        _ => single_key_object(head, replacement),
    }
}

fn child_of<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => items.get(segment.parse::<usize>().ok()?),
        _ => None,
    }
}

fn single_key_object(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

/// Merges the top-level keys of `patch` into `base`, returning a new
/// value.
///
/// Only object/object pairs merge; if either side is not an object the
/// patch wins wholesale.
#[must_use]
pub fn merge_shallow(base: &Value, patch: &Value) -> Value {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            let mut merged = base_map.clone();
            for (key, value) in patch_map {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        _ => patch.clone(),
    }
}

/// Recursively merges `patch` into `base`, returning a new value.
///
/// Nested objects merge key-wise; arrays and scalars are replaced by
/// the patch value.
///
/// # Example
///
/// ```
/// use keel_types::merge_deep;
/// use serde_json::json;
///
/// let base = json!({"ui": {"theme": "dark", "zoom": 1}, "n": 1});
/// let patch = json!({"ui": {"zoom": 2}});
/// let merged = merge_deep(&base, &patch);
///
/// assert_eq!(merged, json!({"ui": {"theme": "dark", "zoom": 2}, "n": 1}));
/// ```
#[must_use]
pub fn merge_deep(base: &Value, patch: &Value) -> Value {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            let mut merged = base_map.clone();
            for (key, patch_value) in patch_map {
                let entry = match base_map.get(key) {
                    Some(base_value) => merge_deep(base_value, patch_value),
                    None => patch_value.clone(),
                };
                merged.insert(key.clone(), entry);
            }
            Value::Object(merged)
        }
        _ => patch.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_path_walks_objects_and_arrays() {
        let v = json!({"a": {"b": {"c": 3}}, "list": [{"x": 1}]});
        assert_eq!(get_path(&v, "a.b.c"), Some(&json!(3)));
        assert_eq!(get_path(&v, "list.0.x"), Some(&json!(1)));
        assert_eq!(get_path(&v, ""), Some(&v));
    }

    #[test]
    fn get_path_missing_segment_is_none() {
        let v = json!({"a": 1});
        assert_eq!(get_path(&v, "a.b"), None);
        assert_eq!(get_path(&v, "z"), None);
        assert_eq!(get_path(&v, "a.0"), None);
    }

    #[test]
    fn set_path_does_not_touch_the_input() {
        let before = json!({"a": {"b": 1}});
        let after = set_path(&before, "a.b", json!(2));
        assert_eq!(before, json!({"a": {"b": 1}}));
        assert_eq!(after, json!({"a": {"b": 2}}));
    }

    #[test]
    fn set_path_creates_intermediate_objects() {
        let before = json!({});
        let after = set_path(&before, "a.b.c", json!("deep"));
        assert_eq!(after, json!({"a": {"b": {"c": "deep"}}}));
    }

    #[test]
    fn set_path_replaces_scalar_in_the_way() {
        let before = json!({"a": 7});
        let after = set_path(&before, "a.b", json!(1));
        assert_eq!(after, json!({"a": {"b": 1}}));
    }

    #[test]
    fn set_path_into_array_index() {
        let before = json!({"items": [1, 2, 3]});
        let after = set_path(&before, "items.1", json!(99));
        assert_eq!(after, json!({"items": [1, 99, 3]}));
    }

    #[test]
    fn set_path_empty_path_replaces_root() {
        let before = json!({"a": 1});
        assert_eq!(set_path(&before, "", json!(5)), json!(5));
    }

    #[test]
    fn merge_shallow_overwrites_top_level_only() {
        let base = json!({"a": {"x": 1}, "b": 2});
        let patch = json!({"a": {"y": 9}});
        assert_eq!(merge_shallow(&base, &patch), json!({"a": {"y": 9}, "b": 2}));
    }

    #[test]
    fn merge_deep_preserves_siblings() {
        let base = json!({"a": {"x": 1, "y": 2}});
        let patch = json!({"a": {"y": 3}});
        assert_eq!(merge_deep(&base, &patch), json!({"a": {"x": 1, "y": 3}}));
    }

    #[test]
    fn merge_deep_non_object_patch_wins() {
        let base = json!({"a": {"x": 1}});
        let patch = json!({"a": [1, 2]});
        assert_eq!(merge_deep(&base, &patch), json!({"a": [1, 2]}));
    }
}
