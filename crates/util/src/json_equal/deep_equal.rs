use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::value::{Array, Object, Value};

/// Keeps a cached address alive so it cannot be handed to a new allocation
/// while its cache entry exists.
enum Pin {
    Array(Weak<Array>),
    Object(Weak<Object>),
}

struct Entry {
    _pins: (Pin, Pin),
    equal: bool,
}

/// Structural equality engine with a bounded memoization cache.
///
/// Semantics:
/// - `NaN` equals `NaN`, `0.0` equals `-0.0`.
/// - Values of different kinds are never equal (`null` is not `false`, an
///   array is never equal to an object).
/// - Arrays are equal when they have the same length and pairwise equal items.
/// - Objects are equal when they have the same key set (names and symbols)
///   and equal values under each key; key order is irrelevant.
/// - Symbols and functions are equal only when reference-identical.
/// - Reference-identical containers are equal without being walked.
///
/// Results for container pairs are cached by allocation address. The cache
/// holds at most `capacity` entries and is cleared wholesale on overflow; a
/// capacity of zero disables caching.
///
/// # Examples
///
/// ```
/// use dentata_util::{DeepEqual, Value};
/// use serde_json::json;
///
/// let eq = DeepEqual::with_capacity(16);
/// let a = Value::from(json!({"foo": [1, 2, 3]}));
/// let b = Value::from(json!({"foo": [1, 2, 3]}));
/// let c = Value::from(json!({"foo": [1, 2, 4]}));
///
/// assert!(eq.equals(&a, &b));
/// assert!(!eq.equals(&a, &c));
/// ```
pub struct DeepEqual {
    capacity: usize,
    cache: RefCell<HashMap<(usize, usize), Entry>>,
}

impl DeepEqual {
    pub const DEFAULT_CAPACITY: usize = 50_000;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached container pairs.
    pub fn cached(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn clear(&self) {
        self.cache.borrow_mut().clear();
    }

    pub fn equals(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),

            (Value::Array(arr_a), Value::Array(arr_b)) => {
                if Rc::ptr_eq(arr_a, arr_b) {
                    return true;
                }
                let key = (Rc::as_ptr(arr_a) as usize, Rc::as_ptr(arr_b) as usize);
                let pins = || {
                    (
                        Pin::Array(Rc::downgrade(arr_a)),
                        Pin::Array(Rc::downgrade(arr_b)),
                    )
                };
                self.memoized(key, pins, || {
                    arr_a.len() == arr_b.len()
                        && arr_a.iter().zip(arr_b.iter()).all(|(x, y)| self.equals(x, y))
                })
            }

            (Value::Object(obj_a), Value::Object(obj_b)) => {
                if Rc::ptr_eq(obj_a, obj_b) {
                    return true;
                }
                let key = (Rc::as_ptr(obj_a) as usize, Rc::as_ptr(obj_b) as usize);
                let pins = || {
                    (
                        Pin::Object(Rc::downgrade(obj_a)),
                        Pin::Object(Rc::downgrade(obj_b)),
                    )
                };
                self.memoized(key, pins, || {
                    obj_a.len() == obj_b.len()
                        && obj_a.iter().all(|(key, val_a)| match obj_b.get(key) {
                            Some(val_b) => self.equals(val_a, val_b),
                            None => false,
                        })
                })
            }

            // Different kinds are never equal
            _ => false,
        }
    }

    /// Equality over possibly absent values: absent equals only absent.
    pub fn equals_opt(&self, a: Option<&Value>, b: Option<&Value>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => self.equals(a, b),
            _ => false,
        }
    }

    fn memoized(
        &self,
        key: (usize, usize),
        pins: impl FnOnce() -> (Pin, Pin),
        compute: impl FnOnce() -> bool,
    ) -> bool {
        if self.capacity == 0 {
            return compute();
        }
        if let Some(entry) = self.cache.borrow().get(&key) {
            return entry.equal;
        }
        let equal = compute();
        let mut cache = self.cache.borrow_mut();
        if cache.len() >= self.capacity {
            cache.clear();
        }
        cache.insert(
            key,
            Entry {
                _pins: pins(),
                equal,
            },
        );
        equal
    }
}

impl Default for DeepEqual {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DeepEqual {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepEqual")
            .field("capacity", &self.capacity)
            .field("cached", &self.cached())
            .finish()
    }
}

thread_local! {
    static SHARED: DeepEqual = DeepEqual::new();
}

/// Performs a deep equality check using the thread's shared engine.
///
/// # Examples
///
/// ```
/// use dentata_util::{deep_equal, Value};
/// use serde_json::json;
///
/// assert!(deep_equal(&Value::from(0.0), &Value::from(-0.0)));
/// assert!(deep_equal(&Value::from(f64::NAN), &Value::from(f64::NAN)));
/// assert!(!deep_equal(&Value::from(json!({})), &Value::from(json!([]))));
/// ```
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    SHARED.with(|eq| eq.equals(a, b))
}

/// [`deep_equal`] over possibly absent values.
pub fn deep_equal_opt(a: Option<&Value>, b: Option<&Value>) -> bool {
    SHARED.with(|eq| eq.equals_opt(a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json_clone::deep_clone;
    use crate::key::{Key, Symbol};
    use crate::value::Function;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    fn eq(a: serde_json::Value, b: serde_json::Value) -> bool {
        deep_equal(&v(a), &v(b))
    }

    // Scalar tests
    #[test]
    fn test_equal_numbers() {
        assert!(eq(json!(1), json!(1)));
    }

    #[test]
    fn test_not_equal_numbers() {
        assert!(!eq(json!(1), json!(2)));
    }

    #[test]
    fn test_number_and_array_not_equal() {
        assert!(!eq(json!(1), json!([])));
    }

    #[test]
    fn test_zero_and_null_not_equal() {
        assert!(!eq(json!(0), json!(null)));
    }

    #[test]
    fn test_nan_equals_nan() {
        assert!(deep_equal(&Value::from(f64::NAN), &Value::from(f64::NAN)));
    }

    #[test]
    fn test_positive_and_negative_zero_equal() {
        assert!(deep_equal(&Value::from(0.0), &Value::from(-0.0)));
    }

    #[test]
    fn test_empty_string_and_null_not_equal() {
        assert!(!eq(json!(""), json!(null)));
    }

    #[test]
    fn test_one_and_true_not_equal() {
        assert!(!eq(json!(1), json!(true)));
    }

    #[test]
    fn test_zero_and_false_not_equal() {
        assert!(!eq(json!(0), json!(false)));
    }

    #[test]
    fn test_null_and_absent_not_equal() {
        assert!(!deep_equal_opt(Some(&Value::Null), None));
        assert!(deep_equal_opt(None, None));
    }

    // Object tests
    #[test]
    fn test_equal_objects_different_order() {
        assert!(eq(json!({"a": 1, "b": "2"}), json!({"b": "2", "a": 1})));
    }

    #[test]
    fn test_not_equal_objects_extra_property() {
        assert!(!eq(
            json!({"a": 1, "b": "2"}),
            json!({"a": 1, "b": "2", "c": []})
        ));
    }

    #[test]
    fn test_not_equal_objects_different_properties() {
        assert!(!eq(
            json!({"a": 1, "b": "2", "c": 3}),
            json!({"a": 1, "b": "2", "d": 3})
        ));
    }

    #[test]
    fn test_empty_object_and_array_not_equal() {
        assert!(!eq(json!({}), json!([])));
    }

    #[test]
    fn test_symbol_keys_take_part_in_key_set() {
        let s = Symbol::new("k");
        let a = Value::object([(Key::from(&s), 1)]);
        let b = Value::object([(Key::from(&s), 1)]);
        let c = Value::object([(Key::from(Symbol::new("k")), 1)]);
        assert!(deep_equal(&a, &b));
        assert!(!deep_equal(&a, &c));
    }

    // Array tests
    #[test]
    fn test_not_equal_arrays_different_length() {
        assert!(!eq(json!([1, 2, 3]), json!([1, 2])));
    }

    #[test]
    fn test_not_equal_arrays_of_objects() {
        assert!(!eq(
            json!([{"a": "a"}, {"b": "b"}]),
            json!([{"a": "a"}, {"b": "c"}])
        ));
    }

    // Opaque values
    #[test]
    fn test_functions_compare_by_identity() {
        let f = Function::new(|_| Value::Null);
        let g = Function::new(|_| Value::Null);
        assert!(deep_equal(&Value::from(f.clone()), &Value::from(f.clone())));
        assert!(!deep_equal(&Value::from(f), &Value::from(g)));
    }

    #[test]
    fn test_symbols_compare_by_identity() {
        let s = Symbol::new("x");
        assert!(deep_equal(&Value::from(s.clone()), &Value::from(s)));
        assert!(!deep_equal(
            &Value::from(Symbol::new("x")),
            &Value::from(Symbol::new("x"))
        ));
    }

    // Cache behaviour
    #[test]
    fn test_identical_reference_skips_cache() {
        let engine = DeepEqual::with_capacity(8);
        let a = v(json!({"x": [1, 2]}));
        assert!(engine.equals(&a, &a.clone()));
        assert_eq!(engine.cached(), 0);
    }

    #[test]
    fn test_cache_is_cleared_on_overflow() {
        let engine = DeepEqual::with_capacity(2);
        let a = v(json!([[1], [2], [3]]));
        let b = deep_clone(&a);
        assert!(engine.equals(&a, &b));
        assert!(engine.cached() <= 2);
        assert!(engine.equals(&a, &b));
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let engine = DeepEqual::with_capacity(0);
        let a = v(json!({"a": {"b": 1}}));
        assert!(engine.equals(&a, &deep_clone(&a)));
        assert_eq!(engine.cached(), 0);
    }

    #[test]
    fn test_cached_result_is_reused() {
        let engine = DeepEqual::with_capacity(64);
        let a = v(json!({"a": {"b": 1}}));
        let b = v(json!({"a": {"b": 2}}));
        assert!(!engine.equals(&a, &b));
        let cached = engine.cached();
        assert!(cached > 0);
        assert!(!engine.equals(&a, &b));
        assert_eq!(engine.cached(), cached);
    }

    // Complex tests
    #[test]
    fn test_big_object() {
        let a = json!({
            "prop1": "value1",
            "prop2": "value2",
            "prop4": {
                "subProp1": "sub value1",
                "subProp2": {
                    "subSubProp1": "sub sub value1",
                    "subSubProp2": [1, 2, {"prop2": 1, "prop": 2}, 4, 5]
                }
            },
            "prop5": 1000
        });
        let b = json!({
            "prop5": 1000,
            "prop1": "value1",
            "prop2": "value2",
            "prop4": {
                "subProp2": {
                    "subSubProp1": "sub sub value1",
                    "subSubProp2": [1, 2, {"prop2": 1, "prop": 2}, 4, 5]
                },
                "subProp1": "sub value1"
            }
        });
        assert!(eq(a, b));
    }
}
