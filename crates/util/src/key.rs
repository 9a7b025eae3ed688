use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// An opaque, identity-compared token.
///
/// Two symbols are equal only if they were produced by the same call to
/// [`Symbol::new`] (or are clones of it), regardless of their description.
/// Symbols may be stored as values and used as object keys.
///
/// # Examples
///
/// ```
/// use dentata_util::Symbol;
///
/// let a = Symbol::new("tag");
/// let b = Symbol::new("tag");
/// assert_eq!(a, a.clone());
/// assert_ne!(a, b);
/// ```
#[derive(Clone)]
pub struct Symbol(Rc<SymbolData>);

struct SymbolData {
    description: Option<String>,
}

impl Symbol {
    /// Create a fresh symbol with a description used for display only.
    pub fn new(description: impl Into<String>) -> Self {
        Self(Rc::new(SymbolData {
            description: Some(description.into()),
        }))
    }

    /// Create a fresh symbol without a description.
    pub fn anonymous() -> Self {
        Self(Rc::new(SymbolData { description: None }))
    }

    pub fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }

    fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.description() {
            Some(d) => write!(f, "Symbol({d})"),
            None => write!(f, "Symbol()"),
        }
    }
}

/// One step of a path into a value tree.
///
/// Objects are keyed by [`Key::Name`] or [`Key::Symbol`], arrays by
/// [`Key::Index`]. Keys are normalized against the container they address:
/// an index used on an object becomes its decimal name, and a canonical
/// decimal name used on an array becomes an index.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Name(String),
    Index(usize),
    Symbol(Symbol),
}

impl Key {
    /// The key as stored in an object map, if it can address an object.
    pub fn to_object_key(&self) -> Option<Key> {
        match self {
            Key::Name(_) | Key::Symbol(_) => Some(self.clone()),
            Key::Index(i) => Some(Key::Name(i.to_string())),
        }
    }

    /// The array position addressed by this key, if any.
    pub fn to_index(&self) -> Option<usize> {
        match self {
            Key::Index(i) => Some(*i),
            Key::Name(s) if is_valid_index(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Key::Symbol(_))
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(s) => write!(f, "{s:?}"),
            Key::Index(i) => write!(f, "{i}"),
            Key::Symbol(s) => write!(f, "{s}"),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(s) => f.write_str(s),
            Key::Index(i) => write!(f, "{i}"),
            Key::Symbol(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Name(s.to_owned())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Name(s)
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key::Name(s.clone())
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Index(i)
    }
}

impl From<Symbol> for Key {
    fn from(s: Symbol) -> Self {
        Key::Symbol(s)
    }
}

impl From<&Symbol> for Key {
    fn from(s: &Symbol) -> Self {
        Key::Symbol(s.clone())
    }
}

/// Check if a string is a canonical non-negative array index.
///
/// Leading zeros are rejected, so `"01"` stays a plain name.
///
/// # Examples
///
/// ```
/// use dentata_util::key::is_valid_index;
///
/// assert!(is_valid_index("0"));
/// assert!(is_valid_index("123"));
/// assert!(!is_valid_index("-1"));
/// assert!(!is_valid_index("01"));
/// assert!(!is_valid_index("abc"));
/// ```
pub fn is_valid_index(index: &str) -> bool {
    if index.is_empty() {
        return false;
    }
    let bytes = index.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|&b| b.is_ascii_digit())
}
