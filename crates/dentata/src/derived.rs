//! Derived cursors: read-only views computed from another observable.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use dentata_path::{diff_keys, KeyDiff};
use dentata_util::{deep_equal, Value};
use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;
use crate::error::Result;
use crate::event::{invoke, shared, ChangeEvent, Listeners, SharedChangeFn, Subscription};

/// Anything that holds a current value and reports changes to it.
pub trait Observable {
    fn get(&self) -> Option<Value>;

    fn on_change<F>(&self, listener: F) -> Result<Subscription>
    where
        F: FnMut(&ChangeEvent, &Subscription) + 'static;
}

impl Observable for Cursor {
    fn get(&self) -> Option<Value> {
        Cursor::get(self)
    }

    fn on_change<F>(&self, listener: F) -> Result<Subscription>
    where
        F: FnMut(&ChangeEvent, &Subscription) + 'static,
    {
        Cursor::on_change(self, listener)
    }
}

/// How a derived cursor decides that its computed value changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equality {
    /// Changed unless old and new are the same value: equal primitives or
    /// the same container allocation.
    #[default]
    Identity,
    /// Changed unless old and new are deep-equal.
    Structural,
}

impl Equality {
    fn changed(self, old: Option<&Value>, new: &Value) -> bool {
        let Some(old) = old else { return true };
        match self {
            Equality::Identity => !old.same(new),
            Equality::Structural => !deep_equal(old, new),
        }
    }
}

type DerivedListeners = Rc<RefCell<Listeners<SharedChangeFn>>>;

/// A value computed from a source observable.
///
/// Change listeners fire only when the source changes and the computed
/// value differs under the chosen [`Equality`]. Derived cursors can be
/// derived from again.
#[derive(Clone)]
pub struct Derived {
    read_source: Rc<dyn Fn() -> Option<Value>>,
    compute: Rc<dyn Fn(&Value) -> Value>,
    listeners: DerivedListeners,
    upstream: Subscription,
    equality: Equality,
}

/// Derive a read-only view of `source`.
///
/// # Example
///
/// ```
/// use dentata::{create_store, derive, Equality, Value};
/// use serde_json::json;
///
/// let root = create_store(Value::from(json!({"w": 5, "h": 10}))).unwrap();
/// let area = derive(
///     &root,
///     |v| {
///         let side = |k: &str| v.at(k).and_then(Value::as_f64).unwrap_or(0.0);
///         Value::from(side("w") * side("h"))
///     },
///     Equality::Structural,
/// )
/// .unwrap();
/// assert_eq!(area.get(), Some(Value::from(50)));
/// ```
pub fn derive<S, F>(source: &S, compute: F, equality: Equality) -> Result<Derived>
where
    S: Observable + Clone + 'static,
    F: Fn(&Value) -> Value + 'static,
{
    let compute: Rc<dyn Fn(&Value) -> Value> = Rc::new(compute);
    let listeners: DerivedListeners = Rc::new(RefCell::new(Listeners::new()));

    let upstream = {
        let compute = Rc::clone(&compute);
        let weak = Rc::downgrade(&listeners);
        source.on_change(move |event, upstream| {
            let Some(listeners) = weak.upgrade() else {
                // Every handle to this derived cursor is gone.
                upstream.unsubscribe();
                return;
            };
            let old = event.old.as_ref().map(|v| compute(v));
            let new = compute(&event.new);
            if !equality.changed(old.as_ref(), &new) {
                return;
            }
            let diff = match &old {
                Some(old) => diff_keys(old, &new),
                None => KeyDiff::NotObject,
            };
            let event = ChangeEvent {
                new,
                old,
                diff,
                path: event.path.clone(),
            };
            fan_out(&listeners, &event);
        })?
    };

    let source = source.clone();
    Ok(Derived {
        read_source: Rc::new(move || source.get()),
        compute,
        listeners,
        upstream,
        equality,
    })
}

fn fan_out(listeners: &DerivedListeners, event: &ChangeEvent) {
    let snapshot = listeners.borrow().snapshot();
    for (id, listener) in snapshot {
        if !listeners.borrow().contains(id) {
            continue;
        }
        invoke(&listener, event, &subscription(Rc::downgrade(listeners), id));
    }
}

fn subscription(listeners: Weak<RefCell<Listeners<SharedChangeFn>>>, id: u64) -> Subscription {
    Subscription::new(move || {
        let Some(shared) = listeners.upgrade() else {
            return false;
        };
        let Ok(mut map) = shared.try_borrow_mut() else {
            return false;
        };
        map.remove(id)
    })
}

impl Derived {
    /// The computed value for the source's current value.
    pub fn get(&self) -> Option<Value> {
        (self.read_source)().map(|v| (self.compute)(&v))
    }

    pub fn on_change<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&ChangeEvent, &Subscription) + 'static,
    {
        let id = self.listeners.borrow_mut().insert(shared(listener));
        subscription(Rc::downgrade(&self.listeners), id)
    }

    pub fn equality(&self) -> Equality {
        self.equality
    }

    /// Stop following the source. Existing listeners stay but never fire
    /// again.
    pub fn detach(&self) -> bool {
        self.upstream.unsubscribe()
    }
}

impl Observable for Derived {
    fn get(&self) -> Option<Value> {
        Derived::get(self)
    }

    fn on_change<F>(&self, listener: F) -> Result<Subscription>
    where
        F: FnMut(&ChangeEvent, &Subscription) + 'static,
    {
        Ok(Derived::on_change(self, listener))
    }
}

impl fmt::Debug for Derived {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Derived")
            .field("equality", &self.equality)
            .field("listeners", &self.listeners.borrow().len())
            .finish_non_exhaustive()
    }
}
