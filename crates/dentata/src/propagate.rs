//! Turning one write into the notifications it owes.
//!
//! Runs while the store is borrowed and only collects work; listeners are
//! called afterwards by the store.

use dentata_path::{diff_values, get, KeyChanges, KeyDiff, Path};
use dentata_util::{DeepEqual, Key, Value};

use crate::event::{ChangeEvent, DeleteFn, SharedChangeFn};
use crate::registry::{CursorId, CursorTree, NodeId};

pub(crate) enum Notification {
    Change {
        cursor: CursorId,
        listeners: Vec<(u64, SharedChangeFn)>,
        event: ChangeEvent,
    },
    Delete {
        cursor: CursorId,
        listeners: Vec<DeleteFn>,
    },
}

struct Propagation<'a> {
    registry: &'a mut CursorTree,
    eq: &'a DeepEqual,
    out: Vec<Notification>,
}

/// Collect notifications for a write at `site` that turned `old_root` into
/// `new_root`.
///
/// Ancestors are notified first, root downwards. Then the cursors at the
/// site, then every registered descendant whose value actually changed, in
/// preorder. Descendants whose value disappeared are pruned and get their
/// delete listeners queued instead.
pub(crate) fn propagate(
    registry: &mut CursorTree,
    eq: &DeepEqual,
    old_root: &Value,
    new_root: &Value,
    site: &[Key],
) -> Vec<Notification> {
    let mut p = Propagation {
        registry,
        eq,
        out: Vec::new(),
    };
    p.ancestors(old_root, new_root, site);
    p.site(old_root, new_root, site);
    p.out
}

/// Collect notifications for the removal of element `index` from the array
/// at `array`.
///
/// Cursors at and below the removed element are pruned right after the
/// ancestors are notified. The array itself and the shifted elements are
/// then handled as a write of the whole array.
pub(crate) fn propagate_removal(
    registry: &mut CursorTree,
    eq: &DeepEqual,
    old_root: &Value,
    new_root: &Value,
    array: &[Key],
    index: &Key,
) -> Vec<Notification> {
    let mut p = Propagation {
        registry,
        eq,
        out: Vec::new(),
    };
    p.ancestors(old_root, new_root, array);
    let removed = p
        .registry
        .find(array)
        .and_then(|node| p.registry.child(node, index));
    if let Some(node) = removed {
        p.prune(node);
    }
    p.site(old_root, new_root, array);
    p.out
}

impl Propagation<'_> {
    fn ancestors(&mut self, old_root: &Value, new_root: &Value, site: &[Key]) {
        for (depth, cursor) in self.registry.ancestor_observers(site) {
            let prefix = &site[..depth];
            let Ok(Some(new)) = get(new_root, prefix) else {
                continue;
            };
            let old = get(old_root, prefix).ok().flatten();
            let event = ChangeEvent {
                new: new.clone(),
                old: old.cloned(),
                diff: step_diff(old, new, &site[depth]),
                path: Path::from(&site[depth..]),
            };
            self.notify(cursor, event);
        }
    }

    fn site(&mut self, old_root: &Value, new_root: &Value, site: &[Key]) {
        let Some(node) = self.registry.find(site) else {
            return;
        };
        let old = get(old_root, site).ok().flatten().cloned();
        let new = get(new_root, site).ok().flatten().cloned();
        self.descend(node, old, new, true);
    }

    fn prune(&mut self, node: NodeId) {
        let removed = self.registry.prune(node);
        self.out
            .extend(removed.into_iter().map(|r| Notification::Delete {
                cursor: r.cursor,
                listeners: r.on_delete,
            }));
    }

    fn descend(&mut self, node: NodeId, old: Option<Value>, new: Option<Value>, known_changed: bool) {
        if !known_changed && self.eq.equals_opt(old.as_ref(), new.as_ref()) {
            return;
        }
        let Some(new) = new else {
            self.prune(node);
            return;
        };

        let listening: Vec<CursorId> = self
            .registry
            .cursors_at(node)
            .iter()
            .copied()
            .filter(|c| self.registry.has_change_listeners(*c))
            .collect();
        if !listening.is_empty() {
            let diff = diff_values(self.eq, old.as_ref(), Some(&new));
            for cursor in listening {
                let event = ChangeEvent {
                    new: new.clone(),
                    old: old.clone(),
                    diff: diff.clone(),
                    path: Path::root(),
                };
                self.notify(cursor, event);
            }
        }

        for (key, child) in self.registry.children(node) {
            let old_child = old.as_ref().and_then(|v| v.get(&key)).cloned();
            let new_child = new.get(&key).cloned();
            self.descend(child, old_child, new_child, false);
        }
    }

    fn notify(&mut self, cursor: CursorId, event: ChangeEvent) {
        let listeners = self
            .registry
            .slot(cursor)
            .map(|s| s.change.snapshot())
            .unwrap_or_default();
        if listeners.is_empty() {
            return;
        }
        self.out.push(Notification::Change {
            cursor,
            listeners,
            event,
        });
    }
}

/// Diff for an ancestor: only the key leading towards the write site is
/// inspected.
fn step_diff(old: Option<&Value>, new: &Value, key: &Key) -> KeyDiff {
    let (Some(Value::Object(old)), Value::Object(new)) = (old, new) else {
        return KeyDiff::NotObject;
    };
    let mut changes = KeyChanges::default();
    match (old.contains_key(key), new.contains_key(key)) {
        (true, true) => changes.changed.push(key.clone()),
        (false, true) => changes.added.push(key.clone()),
        (true, false) => changes.removed.push(key.clone()),
        (false, false) => {}
    }
    KeyDiff::Keys(changes)
}
