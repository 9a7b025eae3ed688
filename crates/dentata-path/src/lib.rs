//! Path utilities for dentata value trees.
//!
//! A [`Path`] is a sequence of [`Key`]s from the root of a tree. This crate
//! reads and writes values at a path, compares object key sets, and formats
//! paths as pointer strings in the style of
//! [JSON Pointer (RFC 6901)](https://tools.ietf.org/html/rfc6901).
//!
//! # Example
//!
//! ```
//! use dentata_path::{format_path, get, parse_path};
//! use dentata_util::Value;
//! use serde_json::json;
//!
//! let path = parse_path("/foo/bar");
//! assert_eq!(format_path(&path), "/foo/bar");
//!
//! let doc = Value::from(json!({"foo": {"bar": 42}}));
//! assert_eq!(get(&doc, &path).unwrap(), Some(&Value::from(42)));
//! ```

use dentata_util::Key;
use thiserror::Error;

pub mod diff;
pub mod get;
pub mod types;

pub use diff::{diff_keys, diff_keys_in, diff_values, KeyChanges, KeyDiff};
pub use get::{get, get_mut, normalize, remove, set};
pub use types::Path;

/// Unescapes a pointer path component.
///
/// `~1` is replaced with `/` and `~0` is replaced with `~`.
///
/// # Example
///
/// ```
/// use dentata_path::unescape_component;
///
/// assert_eq!(unescape_component("a~0b"), "a~b");
/// assert_eq!(unescape_component("c~1d"), "c/d");
/// assert_eq!(unescape_component("no-escapes"), "no-escapes");
/// ```
pub fn unescape_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    // Order matters: ~1 must be replaced before ~0
    component.replace("~1", "/").replace("~0", "~")
}

/// Escapes a pointer path component.
///
/// `/` is replaced with `~1` and `~` is replaced with `~0`.
///
/// # Example
///
/// ```
/// use dentata_path::escape_component;
///
/// assert_eq!(escape_component("a~b"), "a~0b");
/// assert_eq!(escape_component("c/d"), "c~1d");
/// ```
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    // Order matters: ~ must be escaped before /
    component.replace('~', "~0").replace('/', "~1")
}

/// Parse a pointer string into a path of name keys.
///
/// - Empty string is the root path
/// - A leading `/` is optional
/// - Each component is unescaped
///
/// Numeric components stay names; they are normalized to indices when they
/// address an array.
///
/// # Example
///
/// ```
/// use dentata_path::parse_path;
/// use dentata_util::Key;
///
/// assert!(parse_path("").is_root());
/// assert_eq!(parse_path("/").as_slice(), &[Key::from("")]);
/// assert_eq!(parse_path("foo/bar"), parse_path("/foo/bar"));
/// assert_eq!(parse_path("/a~0b/c~1d").as_slice(), &[Key::from("a~b"), Key::from("c/d")]);
/// ```
pub fn parse_path(pointer: &str) -> Path {
    if pointer.is_empty() {
        return Path::root();
    }
    let body = pointer.strip_prefix('/').unwrap_or(pointer);
    body.split('/')
        .map(|component| Key::Name(unescape_component(component)))
        .collect()
}

/// Format path keys into a pointer string.
///
/// Returns an empty string for the root path. Symbol keys are rendered by
/// their description and cannot be parsed back.
///
/// # Example
///
/// ```
/// use dentata_path::format_path;
/// use dentata_util::Key;
///
/// assert_eq!(format_path(&[]), "");
/// assert_eq!(format_path(&[Key::from("foo"), Key::Index(3)]), "/foo/3");
/// assert_eq!(format_path(&[Key::from("a/b")]), "/a~1b");
/// ```
pub fn format_path(path: &[Key]) -> String {
    let mut out = String::new();
    for key in path {
        out.push('/');
        out.push_str(&escape_component(&key.to_string()));
    }
    out
}

/// Check if `prefix` is a strict prefix of `path`.
///
/// # Example
///
/// ```
/// use dentata_path::{is_prefix, parse_path};
///
/// assert!(is_prefix(&parse_path("/foo"), &parse_path("/foo/bar")));
/// assert!(!is_prefix(&parse_path("/foo/bar"), &parse_path("/foo")));
/// assert!(!is_prefix(&parse_path("/foo"), &parse_path("/foo")));
/// ```
pub fn is_prefix(prefix: &[Key], path: &[Key]) -> bool {
    prefix.len() < path.len() && path.starts_with(prefix)
}

/// The part of `path` below `prefix`, if `prefix` is a prefix of (or equal
/// to) `path`.
pub fn strip_prefix<'a>(path: &'a [Key], prefix: &[Key]) -> Option<&'a [Key]> {
    path.strip_prefix(prefix)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("value at '{path}' is not an object or array")]
    NotTraversable { path: Path },
    #[error("nothing at '{path}'")]
    NotFound { path: Path },
    #[error("key '{key}' cannot address the container at '{path}'")]
    InvalidKey { key: String, path: Path },
    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("the root has no parent")]
    NoParent,
}
