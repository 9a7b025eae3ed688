//! Reading and writing values at a path.
//!
//! Writes are path-copying: every container on the way to the target is
//! made unique with `Rc::make_mut`, so snapshots taken before the write keep
//! their old contents and untouched siblings keep their identity.

use std::rc::Rc;

use dentata_util::{Key, Value};

use crate::types::Path;
use crate::PathError;

/// Get a value by path.
///
/// Returns `Ok(None)` when some key on the path is absent and
/// [`PathError::NotTraversable`] when a step lands on a primitive.
///
/// # Example
///
/// ```
/// use dentata_path::{get, Path};
/// use dentata_util::Value;
/// use serde_json::json;
///
/// let doc = Value::from(json!({"foo": {"bar": [10, 20]}}));
/// let val = get(&doc, &Path::parse("/foo/bar/1")).unwrap();
/// assert_eq!(val, Some(&Value::from(20)));
///
/// assert_eq!(get(&doc, &Path::parse("/missing/x")).unwrap(), None);
/// assert!(get(&doc, &Path::parse("/foo/bar/0/x")).is_err());
/// ```
pub fn get<'a>(root: &'a Value, path: &[Key]) -> Result<Option<&'a Value>, PathError> {
    let mut current = root;
    for (depth, key) in path.iter().enumerate() {
        if !current.is_container() {
            return Err(PathError::NotTraversable {
                path: Path::from(&path[..depth]),
            });
        }
        match current.get(key) {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Mutable access to an existing value by path, unsharing every container on
/// the way.
pub fn get_mut<'a>(root: &'a mut Value, path: &[Key]) -> Result<&'a mut Value, PathError> {
    let mut current = root;
    for (depth, key) in path.iter().enumerate() {
        let at = || Path::from(&path[..depth]);
        current = match current {
            Value::Object(map) => {
                let k = key.to_object_key().ok_or_else(|| invalid_key(key, at()))?;
                Rc::make_mut(map)
                    .get_mut(&k)
                    .ok_or_else(|| PathError::NotFound { path: at().child(k.clone()) })?
            }
            Value::Array(arr) => {
                let i = key.to_index().ok_or_else(|| invalid_key(key, at()))?;
                Rc::make_mut(arr)
                    .get_mut(i)
                    .ok_or_else(|| PathError::NotFound { path: at().child(i) })?
            }
            _ => return Err(PathError::NotTraversable { path: at() }),
        };
    }
    Ok(current)
}

/// Set a value by path, inserting the final key if it is absent.
///
/// The parent of the final key must exist. On arrays the final index may be
/// at most the current length (which appends).
///
/// # Example
///
/// ```
/// use dentata_path::{set, Path};
/// use dentata_util::Value;
/// use serde_json::json;
///
/// let mut doc = Value::from(json!({"a": [1]}));
/// let before = doc.clone();
/// set(&mut doc, &Path::parse("/a/1"), Value::from(2)).unwrap();
/// set(&mut doc, &Path::parse("/b"), Value::from("x")).unwrap();
///
/// assert_eq!(doc, Value::from(json!({"a": [1, 2], "b": "x"})));
/// assert_eq!(before, Value::from(json!({"a": [1]})));
/// ```
pub fn set(root: &mut Value, path: &[Key], value: Value) -> Result<(), PathError> {
    let Some((last, parents)) = path.split_last() else {
        *root = value;
        return Ok(());
    };
    match get_mut(root, parents)? {
        Value::Object(map) => {
            let k = last
                .to_object_key()
                .ok_or_else(|| invalid_key(last, Path::from(parents)))?;
            Rc::make_mut(map).insert(k, value);
        }
        Value::Array(arr) => {
            let index = last
                .to_index()
                .ok_or_else(|| invalid_key(last, Path::from(parents)))?;
            let len = arr.len();
            if index > len {
                return Err(PathError::IndexOutOfBounds { index, len });
            }
            let arr = Rc::make_mut(arr);
            if index == len {
                arr.push(value);
            } else {
                arr[index] = value;
            }
        }
        _ => {
            return Err(PathError::NotTraversable {
                path: Path::from(parents),
            })
        }
    }
    Ok(())
}

/// Remove the value at a path and return it.
///
/// Object keys are removed preserving the order of the remaining keys; array
/// elements are removed shifting later elements down. Removing an absent
/// key is not an error and returns `Ok(None)`.
pub fn remove(root: &mut Value, path: &[Key]) -> Result<Option<Value>, PathError> {
    let (last, parents) = path.split_last().ok_or(PathError::NoParent)?;
    match get_mut(root, parents)? {
        Value::Object(map) => {
            let k = last
                .to_object_key()
                .ok_or_else(|| invalid_key(last, Path::from(parents)))?;
            if !map.contains_key(&k) {
                return Ok(None);
            }
            Ok(Rc::make_mut(map).shift_remove(&k))
        }
        Value::Array(arr) => {
            let index = last
                .to_index()
                .ok_or_else(|| invalid_key(last, Path::from(parents)))?;
            if index >= arr.len() {
                return Ok(None);
            }
            Ok(Some(Rc::make_mut(arr).remove(index)))
        }
        _ => Err(PathError::NotTraversable {
            path: Path::from(parents),
        }),
    }
}

/// Rewrite `path` so every key matches the container it addresses in `root`.
///
/// Keys below the point where the tree ends are kept as given.
///
/// # Example
///
/// ```
/// use dentata_path::{normalize, Path};
/// use dentata_util::{Key, Value};
/// use serde_json::json;
///
/// let doc = Value::from(json!({"list": [{"1": true}]}));
/// let path: Path = [Key::from("list"), Key::from("0"), Key::Index(1)].into_iter().collect();
/// let normalized = normalize(&doc, &path).unwrap();
/// assert_eq!(normalized.as_slice(), &[Key::from("list"), Key::Index(0), Key::from("1")]);
/// ```
pub fn normalize(root: &Value, path: &[Key]) -> Result<Path, PathError> {
    let mut out = Vec::with_capacity(path.len());
    let mut current = Some(root);
    for (depth, key) in path.iter().enumerate() {
        let Some(value) = current else {
            out.extend_from_slice(&path[depth..]);
            break;
        };
        if !value.is_container() {
            return Err(PathError::NotTraversable {
                path: Path::from(out),
            });
        }
        let normalized = value
            .normalize_key(key)
            .ok_or_else(|| invalid_key(key, Path::from(&path[..depth])))?;
        current = value.get(&normalized);
        out.push(normalized);
    }
    Ok(Path::from(out))
}

fn invalid_key(key: &Key, path: Path) -> PathError {
    PathError::InvalidKey {
        key: key.to_string(),
        path,
    }
}
