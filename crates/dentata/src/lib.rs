//! dentata - a reactive, path-addressed data tree.
//!
//! A [`Store`] owns one immutable-by-snapshot value tree. [`Cursor`]s point
//! at paths in it, read and write the value there, and subscribe to changes.
//! A write notifies the cursors above the written path, the cursors at it,
//! and the cursors below it whose value actually changed. Cursors whose
//! value is deleted are unregistered and their delete listeners run.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use dentata::{create_store, Value};
//! use serde_json::json;
//!
//! let root = create_store(Value::from(json!({"user": {"name": "ada"}}))).unwrap();
//! let name = root.select("user").unwrap().select("name").unwrap();
//!
//! let seen = Rc::new(Cell::new(0));
//! let counter = seen.clone();
//! root.on_change(move |_, _| counter.set(counter.get() + 1)).unwrap();
//!
//! name.set("grace").unwrap();
//! name.set("grace").unwrap();
//! assert_eq!(seen.get(), 1);
//! ```

pub mod config;
pub mod cursor;
pub mod derived;
pub mod error;
pub mod event;
mod propagate;
mod registry;
pub mod store;

pub use config::StoreConfig;
pub use cursor::Cursor;
pub use derived::{derive, Derived, Equality, Observable};
pub use error::{Error, Result};
pub use event::{ChangeEvent, Subscription};
pub use registry::CursorId;
pub use store::Store;

pub use dentata_path::{KeyChanges, KeyDiff, Path, PathError};
pub use dentata_util::{deep_equal, DeepEqual, Function, Key, Symbol, Value};

/// Create a store holding `initial` and return a cursor on its root.
///
/// Fails with [`Error::AbsentRoot`] when `initial` is `None`.
pub fn create_store(initial: impl Into<Option<Value>>) -> Result<Cursor> {
    create_store_with(initial, &StoreConfig::default())
}

pub fn create_store_with(initial: impl Into<Option<Value>>, config: &StoreConfig) -> Result<Cursor> {
    Ok(Store::try_new(initial.into(), config)?.root())
}
