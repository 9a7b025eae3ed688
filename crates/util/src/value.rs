//! The tree value model.
//!
//! [`Value`] is a JSON-like tagged variant extended with symbols and function
//! references. Containers are reference-counted immutable snapshots: the
//! only way to change a container is to build a new one (see
//! `Rc::make_mut`), which keeps untouched siblings shared and makes
//! reference identity a cheap proof of equality.

use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

use crate::json_equal::deep_equal;
use crate::key::{Key, Symbol};

/// Ordered object map. Keys are always [`Key::Name`] or [`Key::Symbol`].
pub type Object = IndexMap<Key, Value>;

/// Array contents.
pub type Array = Vec<Value>;

type Callable = dyn Fn(&[Value]) -> Value;

/// A function reference stored inside the tree.
///
/// Functions compare by reference identity only.
#[derive(Clone)]
pub struct Function {
    name: Option<Rc<str>>,
    f: Rc<Callable>,
}

impl Function {
    pub fn new(f: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Self {
            name: None,
            f: Rc::new(f),
        }
    }

    pub fn named(name: &str, f: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Self {
            name: Some(Rc::from(name)),
            f: Rc::new(f),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.f)(args)
    }

    /// Whether both handles refer to the same function allocation.
    pub fn ptr_eq(&self, other: &Function) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.f), Rc::as_ptr(&other.f))
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "Function({name})"),
            None => f.write_str("Function"),
        }
    }
}

/// Coarse type tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Symbol,
    Function,
    Array,
    Object,
}

/// A node of the value tree.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Symbol(Symbol),
    Function(Function),
    Array(Rc<Array>),
    Object(Rc<Object>),
}

impl Value {
    /// Build an array value.
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Array(Rc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Build an object value. Index keys are stored under their decimal name.
    ///
    /// # Examples
    ///
    /// ```
    /// use dentata_util::{Key, Value};
    ///
    /// let v = Value::object([("a", Value::from(1)), ("b", Value::from("x"))]);
    /// assert_eq!(v.at("a").and_then(Value::as_f64), Some(1.0));
    /// assert_eq!(v.at(Key::from("b")).and_then(Value::as_str), Some("x"));
    /// ```
    pub fn object<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Into<Value>,
    {
        let mut map = Object::new();
        for (k, v) in entries {
            if let Some(key) = k.into().to_object_key() {
                map.insert(key, v.into());
            }
        }
        Value::Object(Rc::new(map))
    }

    pub fn empty_object() -> Self {
        Value::Object(Rc::new(Object::new()))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Symbol(_) => ValueKind::Symbol,
            Value::Function(_) => ValueKind::Function,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Whether the value can be traversed with a [`Key`].
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Array(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Normalize `key` against this container, or `None` if the key cannot
    /// address it (symbol on an array, non-index name on an array, or any
    /// key on a primitive).
    pub fn normalize_key(&self, key: &Key) -> Option<Key> {
        match self {
            Value::Object(_) => key.to_object_key(),
            Value::Array(_) => key.to_index().map(Key::Index),
            _ => None,
        }
    }

    /// Child at `key`, or `None` if absent or this is not a container.
    pub fn get(&self, key: &Key) -> Option<&Value> {
        match self {
            Value::Object(map) => match key {
                Key::Index(i) => map.get(&Key::Name(i.to_string())),
                _ => map.get(key),
            },
            Value::Array(arr) => arr.get(key.to_index()?),
            _ => None,
        }
    }

    /// Convenience form of [`Value::get`] taking anything convertible to a key.
    pub fn at(&self, key: impl Into<Key>) -> Option<&Value> {
        self.get(&key.into())
    }

    /// Identity comparison: primitives by value (`NaN` is unequal to itself),
    /// containers, symbols and functions by reference.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Convert to a `serde_json` value.
    ///
    /// Returns `None` if the tree holds a symbol, a function, a symbol key or
    /// a non-finite number, none of which JSON can represent. Integral numbers
    /// are emitted as integers.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        Some(match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n)?,
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Symbol(_) | Value::Function(_) => return None,
            Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(Value::to_json).collect::<Option<_>>()?)
            }
            Value::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (k, v) in map.iter() {
                    let Key::Name(name) = k else {
                        return None;
                    };
                    out.insert(name.clone(), v.to_json()?);
                }
                serde_json::Value::Object(out)
            }
        })
    }
}

fn number_to_json(n: f64) -> Option<serde_json::Value> {
    const MAX_SAFE: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE {
        return Some(serde_json::Value::from(n as i64));
    }
    serde_json::Number::from_f64(n).map(serde_json::Value::Number)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        deep_equal(self, other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::Function(func) => write!(f, "{func:?}"),
            Value::Array(arr) => f.debug_list().entries(arr.iter()).finish(),
            Value::Object(map) => f.debug_map().entries(map.iter()).finish(),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => Value::array(arr),
            serde_json::Value::Object(map) => Value::object(map),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Value::Symbol(s)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(items))
    }
}

impl From<Object> for Value {
    fn from(map: Object) -> Self {
        Value::object(map)
    }
}
