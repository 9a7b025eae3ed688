//! Change events, subscriptions and listener storage.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use dentata_path::{KeyDiff, Path};
use dentata_util::Value;
use tracing::trace;

/// What a change listener receives.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Value now held by the observed cursor.
    pub new: Value,
    /// Value held before the write, `None` if it did not exist.
    pub old: Option<Value>,
    /// Key-level summary of `old` to `new`. For ancestors of the write site
    /// it names only the key on the way to the site.
    pub diff: KeyDiff,
    /// Where the write happened, relative to the observed cursor. Empty when
    /// the observed value itself was written or was reached by descent.
    pub path: Path,
}

/// Handle returned by `on_change` / `on_delete` and passed to every change
/// listener invocation.
///
/// Dropping it does not unsubscribe.
#[derive(Clone)]
pub struct Subscription {
    cancel: Rc<dyn Fn() -> bool>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl Fn() -> bool + 'static) -> Self {
        Self {
            cancel: Rc::new(cancel),
        }
    }

    /// Remove the listener. Returns `false` if it was already removed.
    pub fn unsubscribe(&self) -> bool {
        (self.cancel)()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

pub(crate) type ChangeFn = dyn FnMut(&ChangeEvent, &Subscription);
pub(crate) type SharedChangeFn = Rc<RefCell<Box<ChangeFn>>>;
pub(crate) type DeleteFn = Box<dyn FnOnce()>;

/// Listeners keyed by registration order.
pub(crate) struct Listeners<T> {
    next_listener_id: u64,
    entries: BTreeMap<u64, T>,
}

impl<T> Listeners<T> {
    pub(crate) fn new() -> Self {
        Self {
            next_listener_id: 1,
            entries: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, listener: T) -> u64 {
        let id = self.next_listener_id;
        self.next_listener_id = self.next_listener_id.saturating_add(1);
        self.entries.insert(id, listener);
        id
    }

    pub(crate) fn remove(&mut self, id: u64) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub(crate) fn contains(&self, id: u64) -> bool {
        self.entries.contains_key(&id)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn drain(&mut self) -> Vec<T> {
        std::mem::take(&mut self.entries).into_values().collect()
    }
}

impl<T: Clone> Listeners<T> {
    pub(crate) fn snapshot(&self) -> Vec<(u64, T)> {
        self.entries.iter().map(|(id, l)| (*id, l.clone())).collect()
    }
}

impl<T> Default for Listeners<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn shared(listener: impl FnMut(&ChangeEvent, &Subscription) + 'static) -> SharedChangeFn {
    Rc::new(RefCell::new(Box::new(listener)))
}

/// Run a change listener unless it is already running further up the stack.
pub(crate) fn invoke(listener: &SharedChangeFn, event: &ChangeEvent, subscription: &Subscription) {
    match listener.try_borrow_mut() {
        Ok(mut f) => (&mut **f)(event, subscription),
        Err(_) => trace!(path = %event.path, "listener already running, skipped"),
    }
}
