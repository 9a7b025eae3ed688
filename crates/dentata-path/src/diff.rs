//! Key-level comparison of two objects.

use std::rc::Rc;

use dentata_util::{deep_equal, DeepEqual, Key, Value};

/// Keys that differ between two objects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyChanges {
    /// Keys present only in the new object, in new-object order.
    pub added: Vec<Key>,
    /// Keys present only in the old object, in old-object order.
    pub removed: Vec<Key>,
    /// Keys present in both whose values are not deep-equal, in old-object order.
    pub changed: Vec<Key>,
}

impl KeyChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Classification of a transition between two values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyDiff {
    /// Both sides are the same object, or both are empty objects.
    NoDiff,
    /// At least one side is not an object; the transition is a plain swap.
    NotObject,
    /// Object-to-object transition.
    Keys(KeyChanges),
}

impl KeyDiff {
    pub fn keys(&self) -> Option<&KeyChanges> {
        match self {
            KeyDiff::Keys(changes) => Some(changes),
            _ => None,
        }
    }
}

/// Compare the key sets of two objects using the thread's shared equality
/// engine.
///
/// # Example
///
/// ```
/// use dentata_path::{diff_keys, KeyDiff};
/// use dentata_util::{Key, Value};
/// use serde_json::json;
///
/// let old = Value::from(json!({"a": 1, "b": 2, "c": 3}));
/// let new = Value::from(json!({"b": 2, "c": 4, "d": 5}));
/// let KeyDiff::Keys(changes) = diff_keys(&old, &new) else { panic!() };
/// assert_eq!(changes.added, vec![Key::from("d")]);
/// assert_eq!(changes.removed, vec![Key::from("a")]);
/// assert_eq!(changes.changed, vec![Key::from("c")]);
/// ```
pub fn diff_keys(old: &Value, new: &Value) -> KeyDiff {
    diff_keys_with(&EqualityRef::Shared, old, new)
}

/// [`diff_keys`] with an explicit equality engine.
pub fn diff_keys_in(eq: &DeepEqual, old: &Value, new: &Value) -> KeyDiff {
    diff_keys_with(&EqualityRef::Engine(eq), old, new)
}

/// Diff two possibly absent values. Anything other than two objects is
/// [`KeyDiff::NotObject`].
pub fn diff_values(eq: &DeepEqual, old: Option<&Value>, new: Option<&Value>) -> KeyDiff {
    match (old, new) {
        (Some(old), Some(new)) => diff_keys_in(eq, old, new),
        _ => KeyDiff::NotObject,
    }
}

enum EqualityRef<'a> {
    Shared,
    Engine(&'a DeepEqual),
}

impl EqualityRef<'_> {
    fn equals(&self, a: &Value, b: &Value) -> bool {
        match self {
            EqualityRef::Shared => deep_equal(a, b),
            EqualityRef::Engine(eq) => eq.equals(a, b),
        }
    }
}

fn diff_keys_with(eq: &EqualityRef<'_>, old: &Value, new: &Value) -> KeyDiff {
    let (Value::Object(old_obj), Value::Object(new_obj)) = (old, new) else {
        return KeyDiff::NotObject;
    };
    if Rc::ptr_eq(old_obj, new_obj) || (old_obj.is_empty() && new_obj.is_empty()) {
        return KeyDiff::NoDiff;
    }
    let mut changes = KeyChanges::default();
    for (key, old_val) in old_obj.iter() {
        match new_obj.get(key) {
            Some(new_val) => {
                if !eq.equals(old_val, new_val) {
                    changes.changed.push(key.clone());
                }
            }
            None => changes.removed.push(key.clone()),
        }
    }
    for key in new_obj.keys() {
        if !old_obj.contains_key(key) {
            changes.added.push(key.clone());
        }
    }
    KeyDiff::Keys(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn test_identical_object_is_no_diff() {
        let a = v(json!({"x": 1}));
        assert_eq!(diff_keys(&a, &a.clone()), KeyDiff::NoDiff);
    }

    #[test]
    fn test_empty_objects_are_no_diff() {
        assert_eq!(diff_keys(&v(json!({})), &v(json!({}))), KeyDiff::NoDiff);
    }

    #[test]
    fn test_non_objects() {
        assert_eq!(diff_keys(&v(json!(1)), &v(json!({}))), KeyDiff::NotObject);
        assert_eq!(diff_keys(&v(json!([1])), &v(json!([2]))), KeyDiff::NotObject);
        let eq = DeepEqual::with_capacity(0);
        assert_eq!(diff_values(&eq, None, Some(&v(json!({})))), KeyDiff::NotObject);
    }

    #[test]
    fn test_equal_but_distinct_objects_have_empty_changes() {
        let diff = diff_keys(&v(json!({"a": [1]})), &v(json!({"a": [1]})));
        assert_eq!(diff, KeyDiff::Keys(KeyChanges::default()));
        assert!(diff.keys().is_some_and(KeyChanges::is_empty));
    }

    #[test]
    fn test_nested_change_is_reported_on_top_key() {
        let eq = DeepEqual::with_capacity(16);
        let diff = diff_keys_in(&eq, &v(json!({"a": {"b": 1}, "c": 0})), &v(json!({"a": {"b": 2}, "c": 0})));
        assert_eq!(
            diff,
            KeyDiff::Keys(KeyChanges {
                changed: vec![Key::from("a")],
                ..KeyChanges::default()
            })
        );
    }
}
