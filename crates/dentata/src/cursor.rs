//! Cursors: handles to one location in a store.

use std::fmt;

use dentata_path::Path;
use dentata_util::{Key, Value};
use tracing::trace;

use crate::error::{Error, Result};
use crate::event::{ChangeEvent, Subscription};
use crate::registry::CursorId;
use crate::store::Store;

/// A handle on the value at a fixed path.
///
/// Every cursor is registered with its store until the value at its path is
/// deleted or [`Cursor::release`] is called. After that it is detached:
/// reads still look at the path, but writes and subscriptions fail with
/// [`Error::Detached`].
///
/// Cloning a cursor clones the handle, not the registration.
#[derive(Clone)]
pub struct Cursor {
    store: Store,
    id: CursorId,
    path: Path,
}

impl Cursor {
    pub(crate) fn new(store: Store, id: CursorId, path: Path) -> Self {
        Self { store, id, path }
    }

    pub fn id(&self) -> CursorId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn is_detached(&self) -> bool {
        !self.store.is_registered(self.id)
    }

    /// Current value, `None` if nothing is at this path.
    pub fn get(&self) -> Option<Value> {
        match self.store.read(&self.path) {
            Ok(value) => value,
            Err(err) => {
                trace!(path = %self.path, error = %err, "cursor path no longer resolves");
                None
            }
        }
    }

    /// Current value of one child.
    pub fn get_key(&self, key: impl Into<Key>) -> Result<Option<Value>> {
        let key = key.into();
        let container = self.container()?;
        Ok(container.get(&key).cloned())
    }

    /// Replace the value at this path.
    pub fn set(&self, value: impl Into<Value>) -> Result<()> {
        self.ensure_attached()?;
        self.store.write(&self.path, Some(value.into()))
    }

    /// Delete the value at this path. Deleting the root is an error.
    pub fn delete(&self) -> Result<()> {
        self.ensure_attached()?;
        self.store.write(&self.path, None)
    }

    /// Set one child of the container at this path.
    pub fn set_in(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<()> {
        self.ensure_attached()?;
        let key = self.child_key(&self.container()?, key.into())?;
        self.store.write(&self.path.child(key), Some(value.into()))
    }

    /// Replace the value with `f(current)`.
    pub fn update(&self, f: impl FnOnce(&Value) -> Value) -> Result<()> {
        self.ensure_attached()?;
        let current = self.get().ok_or_else(|| Error::Absent {
            path: self.path.clone(),
        })?;
        self.store.write(&self.path, Some(f(&current)))
    }

    /// Alias of [`Cursor::update`].
    pub fn apply(&self, f: impl FnOnce(&Value) -> Value) -> Result<()> {
        self.update(f)
    }

    /// A new cursor on an existing child.
    ///
    /// Fails if this value is not an object or array, if the key cannot
    /// address it, or if nothing is stored under the key.
    pub fn select(&self, key: impl Into<Key>) -> Result<Cursor> {
        self.ensure_attached()?;
        let container = self.container()?;
        let key = self.child_key(&container, key.into())?;
        let path = self.path.child(key.clone());
        if container.get(&key).is_none() {
            return Err(Error::Absent { path });
        }
        Ok(self.store.register(path))
    }

    /// Alias of [`Cursor::select`].
    pub fn s(&self, key: impl Into<Key>) -> Result<Cursor> {
        self.select(key)
    }

    /// Listen for changes to the value at this path.
    ///
    /// Listeners run synchronously after each write that changes the value,
    /// in registration order.
    pub fn on_change<F>(&self, listener: F) -> Result<Subscription>
    where
        F: FnMut(&ChangeEvent, &Subscription) + 'static,
    {
        self.store
            .add_change_listener(self.id, Box::new(listener))
            .ok_or_else(|| self.detached())
    }

    /// Listen for the deletion of the value at this path. Fires at most once.
    pub fn on_delete<F>(&self, listener: F) -> Result<Subscription>
    where
        F: FnOnce() + 'static,
    {
        self.store
            .add_delete_listener(self.id, Box::new(listener))
            .ok_or_else(|| self.detached())
    }

    /// Number of change listeners currently registered on this cursor.
    pub fn listener_count(&self) -> usize {
        self.store.listener_count(self.id)
    }

    /// Remove every listener of this cursor.
    pub fn clear_listeners(&self) {
        self.store.clear_listeners(&[self.id]);
    }

    /// Remove every listener of every cursor at or below this path.
    pub fn clear_listeners_recursive(&self) {
        let cursors = self.store.cursors_below(&self.path);
        self.store.clear_listeners(&cursors);
    }

    /// Unregister this cursor without firing its delete listeners.
    pub fn release(&self) -> bool {
        self.store.release(self.id)
    }

    fn ensure_attached(&self) -> Result<()> {
        if self.is_detached() {
            return Err(self.detached());
        }
        Ok(())
    }

    fn detached(&self) -> Error {
        Error::Detached {
            path: self.path.clone(),
        }
    }

    fn container(&self) -> Result<Value> {
        match self.get() {
            Some(value) if value.is_container() => Ok(value),
            Some(_) => Err(Error::NotTraversable {
                path: self.path.clone(),
            }),
            None => Err(Error::Absent {
                path: self.path.clone(),
            }),
        }
    }

    fn child_key(&self, container: &Value, key: Key) -> Result<Key> {
        container.normalize_key(&key).ok_or_else(|| Error::InvalidKey {
            key: key.to_string(),
            path: self.path.clone(),
        })
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("id", &self.id)
            .field("path", &self.path)
            .finish()
    }
}
