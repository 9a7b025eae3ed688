//! The store: one value tree, its cursor registry and its equality cache.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use dentata_path::{get, normalize, remove, set, Path};
use dentata_util::{DeepEqual, Key, Value};
use tracing::{debug, trace};

use crate::config::StoreConfig;
use crate::cursor::Cursor;
use crate::error::{Error, Result};
use crate::event::{invoke, ChangeFn, DeleteFn, Subscription};
use crate::propagate::{propagate, propagate_removal, Notification};
use crate::registry::{CursorId, CursorTree};

pub(crate) struct StoreState {
    data: Value,
    registry: CursorTree,
    equality: DeepEqual,
}

impl StoreState {
    fn apply_write(&mut self, path: &[Key], value: Option<Value>) -> Result<Vec<Notification>> {
        let path = normalize(&self.data, path)?;
        if path.is_root() && value.is_none() {
            return Err(Error::AbsentRoot);
        }
        if self.equality.equals_opt(get(&self.data, &path)?, value.as_ref()) {
            trace!(path = %path, "write left the tree unchanged");
            return Ok(Vec::new());
        }

        let old_root = self.data.clone();
        if let Some(value) = value {
            set(&mut self.data, &path, value)?;
            let notifications = propagate(
                &mut self.registry,
                &self.equality,
                &old_root,
                &self.data,
                &path,
            );
            debug!(path = %path, notifications = notifications.len(), "propagated write");
            return Ok(notifications);
        }

        remove(&mut self.data, &path)?;
        let parent = path.parent().unwrap_or_default();
        let notifications = match (get(&self.data, &parent), path.last()) {
            // Later elements shift down, so the array as a whole was written.
            (Ok(Some(Value::Array(_))), Some(index)) => propagate_removal(
                &mut self.registry,
                &self.equality,
                &old_root,
                &self.data,
                &parent,
                index,
            ),
            _ => propagate(
                &mut self.registry,
                &self.equality,
                &old_root,
                &self.data,
                &path,
            ),
        };
        debug!(path = %path, notifications = notifications.len(), "propagated delete");
        Ok(notifications)
    }
}

/// A reactive value tree.
///
/// `Store` is a cheap handle; clones share the same tree. All access goes
/// through [`Cursor`]s or the path-based methods below.
#[derive(Clone)]
pub struct Store {
    inner: Rc<RefCell<StoreState>>,
}

impl Store {
    /// Create a store with the default configuration.
    pub fn new(initial: impl Into<Value>) -> Self {
        Self::with_config(initial, &StoreConfig::default())
    }

    pub fn with_config(initial: impl Into<Value>, config: &StoreConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreState {
                data: initial.into(),
                registry: CursorTree::new(),
                equality: config.equality(),
            })),
        }
    }

    /// Like [`Store::with_config`], but rejects an absent initial value.
    pub fn try_new(initial: Option<Value>, config: &StoreConfig) -> Result<Self> {
        let initial = initial.ok_or(Error::AbsentRoot)?;
        Ok(Self::with_config(initial, config))
    }

    /// A new cursor on the whole tree.
    pub fn root(&self) -> Cursor {
        self.register(Path::root())
    }

    /// A new cursor on an existing value.
    pub fn cursor(&self, path: impl Into<Path>) -> Result<Cursor> {
        let path: Path = path.into();
        let path = {
            let state = self.inner.borrow();
            let path = normalize(&state.data, &path)?;
            if get(&state.data, &path)?.is_none() {
                return Err(Error::Absent { path });
            }
            path
        };
        Ok(self.register(path))
    }

    /// Snapshot of the whole tree.
    pub fn get(&self) -> Value {
        self.inner.borrow().data.clone()
    }

    /// Snapshot of the value at `path`, `None` if absent.
    pub fn read(&self, path: &[Key]) -> Result<Option<Value>> {
        Ok(get(&self.inner.borrow().data, path)?.cloned())
    }

    /// Write `value` at `path` (`None` deletes) and notify affected cursors.
    ///
    /// A write that leaves the tree deep-equal to what it was is a no-op.
    pub fn write(&self, path: &[Key], value: Option<Value>) -> Result<()> {
        let notifications = self.inner.borrow_mut().apply_write(path, value)?;
        self.dispatch(notifications);
        Ok(())
    }

    /// Number of registered cursors.
    pub fn cursor_count(&self) -> usize {
        self.inner.borrow().registry.cursor_count()
    }

    /// Number of cursor tree nodes, the root included.
    pub fn registry_len(&self) -> usize {
        self.inner.borrow().registry.node_count()
    }

    /// Entries in the equality cache.
    pub fn cached_comparisons(&self) -> usize {
        self.inner.borrow().equality.cached()
    }

    pub(crate) fn register(&self, path: Path) -> Cursor {
        let id = self.inner.borrow_mut().registry.register(&path);
        Cursor::new(self.clone(), id, path)
    }

    pub(crate) fn is_registered(&self, cursor: CursorId) -> bool {
        self.inner.borrow().registry.is_registered(cursor)
    }

    pub(crate) fn release(&self, cursor: CursorId) -> bool {
        self.inner.borrow_mut().registry.release(cursor)
    }

    pub(crate) fn add_change_listener(&self, cursor: CursorId, listener: Box<ChangeFn>) -> Option<Subscription> {
        let id = {
            let mut state = self.inner.borrow_mut();
            let slot = state.registry.slot_mut(cursor)?;
            slot.change.insert(Rc::new(RefCell::new(listener)))
        };
        Some(self.change_subscription(cursor, id))
    }

    pub(crate) fn add_delete_listener(&self, cursor: CursorId, listener: DeleteFn) -> Option<Subscription> {
        let id = {
            let mut state = self.inner.borrow_mut();
            let slot = state.registry.slot_mut(cursor)?;
            slot.delete.insert(listener)
        };
        let weak = Rc::downgrade(&self.inner);
        Some(Subscription::new(move || {
            with_state(&weak, |state| state.registry.remove_delete_listener(cursor, id))
        }))
    }

    /// Drop every listener of the given cursors.
    pub(crate) fn clear_listeners(&self, cursors: &[CursorId]) {
        let mut state = self.inner.borrow_mut();
        for cursor in cursors {
            if let Some(slot) = state.registry.slot_mut(*cursor) {
                slot.change.clear();
                slot.delete.clear();
            }
        }
    }

    pub(crate) fn listener_count(&self, cursor: CursorId) -> usize {
        self.inner
            .borrow()
            .registry
            .slot(cursor)
            .map_or(0, |s| s.change.len())
    }

    pub(crate) fn cursors_below(&self, path: &[Key]) -> Vec<CursorId> {
        self.inner.borrow().registry.cursors_below(path)
    }

    fn change_subscription(&self, cursor: CursorId, id: u64) -> Subscription {
        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            with_state(&weak, |state| state.registry.remove_change_listener(cursor, id))
        })
    }

    fn is_listening(&self, cursor: CursorId, id: u64) -> bool {
        self.inner
            .borrow()
            .registry
            .slot(cursor)
            .is_some_and(|s| s.change.contains(id))
    }

    /// Call listeners with the store unborrowed, so they may read and write.
    fn dispatch(&self, notifications: Vec<Notification>) {
        for notification in notifications {
            match notification {
                Notification::Change {
                    cursor,
                    listeners,
                    event,
                } => {
                    for (id, listener) in listeners {
                        // Unsubscribed by an earlier listener in this round.
                        if !self.is_listening(cursor, id) {
                            continue;
                        }
                        invoke(&listener, &event, &self.change_subscription(cursor, id));
                    }
                }
                Notification::Delete { cursor, listeners } => {
                    trace!(cursor = ?cursor, listeners = listeners.len(), "cursor deleted");
                    for listener in listeners {
                        listener();
                    }
                }
            }
        }
    }
}

fn with_state(weak: &Weak<RefCell<StoreState>>, f: impl FnOnce(&mut StoreState) -> bool) -> bool {
    let Some(inner) = weak.upgrade() else {
        return false;
    };
    let Ok(mut state) = inner.try_borrow_mut() else {
        return false;
    };
    f(&mut state)
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(state) => f
                .debug_struct("Store")
                .field("data", &state.data)
                .field("cursors", &state.registry.cursor_count())
                .finish(),
            Err(_) => f.write_str("Store { <writing> }"),
        }
    }
}
