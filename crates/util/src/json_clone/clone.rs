use std::rc::Rc;

use crate::value::{Object, Value};

/// Creates a deep clone of a tree value.
///
/// `Value::clone` shares containers; this function rebuilds every array and
/// object so the result is structurally equal to the input but shares no
/// container identity with it. Symbols and functions keep their identity.
///
/// # Examples
///
/// ```
/// use dentata_util::{deep_clone, Value};
/// use serde_json::json;
///
/// let original = Value::from(json!({"foo": [1, 2, 3]}));
/// let cloned = deep_clone(&original);
///
/// assert_eq!(original, cloned);
/// assert!(!original.same(&cloned));
/// ```
pub fn deep_clone(value: &Value) -> Value {
    match value {
        Value::Array(arr) => Value::Array(Rc::new(arr.iter().map(deep_clone).collect())),
        Value::Object(obj) => {
            let mut new_obj = Object::with_capacity(obj.len());
            for (key, val) in obj.iter() {
                new_obj.insert(key.clone(), deep_clone(val));
            }
            Value::Object(Rc::new(new_obj))
        }
        other => other.clone(),
    }
}
