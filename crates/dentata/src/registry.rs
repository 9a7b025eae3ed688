//! The cursor tree: live cursors indexed by path.
//!
//! Nodes live in a `Vec` arena and refer to each other by index. A node
//! exists only while it, or something below it, holds a cursor; the root
//! node is the one exception and is never removed.

use std::collections::HashMap;
use std::fmt;

use dentata_util::Key;
use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::event::{DeleteFn, Listeners, SharedChangeFn};

pub(crate) type NodeId = usize;

pub(crate) const ROOT: NodeId = 0;

/// Identifies one registered cursor within its store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CursorId(u64);

impl fmt::Debug for CursorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CursorId({})", self.0)
    }
}

pub(crate) struct CursorSlot {
    node: NodeId,
    pub(crate) change: Listeners<SharedChangeFn>,
    pub(crate) delete: Listeners<DeleteFn>,
}

struct Node {
    parent: Option<NodeId>,
    key: Option<Key>,
    cursors: Vec<CursorId>,
    children: IndexMap<Key, NodeId>,
}

impl Node {
    fn new(parent: Option<NodeId>, key: Option<Key>) -> Self {
        Self {
            parent,
            key,
            cursors: Vec::new(),
            children: IndexMap::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.cursors.is_empty() && self.children.is_empty()
    }
}

/// A cursor removed by [`CursorTree::prune`], with the delete listeners it
/// still held.
pub(crate) struct Removed {
    pub(crate) cursor: CursorId,
    pub(crate) on_delete: Vec<DeleteFn>,
}

pub(crate) struct CursorTree {
    nodes: Vec<Option<Node>>,
    free: Vec<NodeId>,
    slots: HashMap<CursorId, CursorSlot>,
    next_cursor_id: u64,
}

impl CursorTree {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![Some(Node::new(None, None))],
            free: Vec::new(),
            slots: HashMap::new(),
            next_cursor_id: 1,
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id).and_then(Option::as_mut)
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }

    fn release_node(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.get_mut(id)?.take()?;
        self.free.push(id);
        Some(node)
    }

    /// Register a new cursor at `path`, creating intermediate nodes.
    pub(crate) fn register(&mut self, path: &[Key]) -> CursorId {
        let mut node = ROOT;
        for key in path {
            node = self.child_or_insert(node, key);
        }
        let id = CursorId(self.next_cursor_id);
        self.next_cursor_id = self.next_cursor_id.saturating_add(1);
        if let Some(n) = self.node_mut(node) {
            n.cursors.push(id);
        }
        self.slots.insert(
            id,
            CursorSlot {
                node,
                change: Listeners::new(),
                delete: Listeners::new(),
            },
        );
        trace!(cursor = ?id, depth = path.len(), "registered cursor");
        id
    }

    fn child_or_insert(&mut self, parent: NodeId, key: &Key) -> NodeId {
        if let Some(child) = self.child(parent, key) {
            return child;
        }
        let child = self.alloc(Node::new(Some(parent), Some(key.clone())));
        if let Some(n) = self.node_mut(parent) {
            n.children.insert(key.clone(), child);
        }
        child
    }

    /// Child of `node` under `key`. An index and its decimal name address
    /// the same child, since a path may have been normalized against an
    /// array and later written against an object, or the other way round.
    pub(crate) fn child(&self, node: NodeId, key: &Key) -> Option<NodeId> {
        let children = &self.node(node)?.children;
        children
            .get(key)
            .or_else(|| alias(key).and_then(|k| children.get(&k)))
            .copied()
    }

    pub(crate) fn children(&self, node: NodeId) -> Vec<(Key, NodeId)> {
        self.node(node)
            .map(|n| n.children.iter().map(|(k, id)| (k.clone(), *id)).collect())
            .unwrap_or_default()
    }

    pub(crate) fn find(&self, path: &[Key]) -> Option<NodeId> {
        path.iter().try_fold(ROOT, |node, key| self.child(node, key))
    }

    pub(crate) fn cursors_at(&self, node: NodeId) -> &[CursorId] {
        self.node(node).map(|n| n.cursors.as_slice()).unwrap_or(&[])
    }

    /// Cursors with change listeners on nodes strictly above `path`, paired
    /// with their depth.
    pub(crate) fn ancestor_observers(&self, path: &[Key]) -> Vec<(usize, CursorId)> {
        let mut out = Vec::new();
        let mut node = ROOT;
        for (depth, key) in path.iter().enumerate() {
            out.extend(
                self.cursors_at(node)
                    .iter()
                    .filter(|c| self.has_change_listeners(**c))
                    .map(|c| (depth, *c)),
            );
            match self.child(node, key) {
                Some(next) => node = next,
                None => break,
            }
        }
        out
    }

    /// Every cursor at or below `path`, parents before children.
    pub(crate) fn cursors_below(&self, path: &[Key]) -> Vec<CursorId> {
        let Some(start) = self.find(path) else {
            return Vec::new();
        };
        self.preorder(start)
            .into_iter()
            .flat_map(|id| self.cursors_at(id).to_vec())
            .collect()
    }

    fn preorder(&self, start: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else { continue };
            order.push(id);
            stack.extend(node.children.values().rev());
        }
        order
    }

    pub(crate) fn slot(&self, cursor: CursorId) -> Option<&CursorSlot> {
        self.slots.get(&cursor)
    }

    pub(crate) fn slot_mut(&mut self, cursor: CursorId) -> Option<&mut CursorSlot> {
        self.slots.get_mut(&cursor)
    }

    pub(crate) fn is_registered(&self, cursor: CursorId) -> bool {
        self.slots.contains_key(&cursor)
    }

    pub(crate) fn has_change_listeners(&self, cursor: CursorId) -> bool {
        self.slot(cursor).is_some_and(|s| !s.change.is_empty())
    }

    pub(crate) fn remove_change_listener(&mut self, cursor: CursorId, id: u64) -> bool {
        self.slot_mut(cursor).is_some_and(|s| s.change.remove(id))
    }

    pub(crate) fn remove_delete_listener(&mut self, cursor: CursorId, id: u64) -> bool {
        self.slot_mut(cursor).is_some_and(|s| s.delete.remove(id))
    }

    /// Remove the subtree at `node` and unregister every cursor in it.
    ///
    /// Cursors come back in preorder. Empty ancestors are collapsed. The
    /// root node cannot be pruned.
    pub(crate) fn prune(&mut self, node: NodeId) -> Vec<Removed> {
        if node == ROOT {
            return Vec::new();
        }
        let (parent, key) = match self.node(node) {
            Some(n) => (n.parent, n.key.clone()),
            None => return Vec::new(),
        };
        let mut removed = Vec::new();
        for id in self.preorder(node) {
            let Some(n) = self.release_node(id) else { continue };
            for cursor in n.cursors {
                if let Some(mut slot) = self.slots.remove(&cursor) {
                    removed.push(Removed {
                        cursor,
                        on_delete: slot.delete.drain(),
                    });
                }
            }
        }
        if let (Some(parent), Some(key)) = (parent, key) {
            if let Some(p) = self.node_mut(parent) {
                p.children.shift_remove(&key);
            }
            self.collapse(parent);
        }
        debug!(cursors = removed.len(), "pruned deleted subtree");
        removed
    }

    /// Remove `node` and its ancestors for as long as they are empty.
    fn collapse(&mut self, mut node: NodeId) {
        while node != ROOT {
            let Some(n) = self.node(node) else { return };
            if !n.is_empty() {
                return;
            }
            let (parent, key) = (n.parent, n.key.clone());
            self.release_node(node);
            let (Some(parent), Some(key)) = (parent, key) else { return };
            if let Some(p) = self.node_mut(parent) {
                p.children.shift_remove(&key);
            }
            node = parent;
        }
    }

    /// Unregister one cursor without notifying it.
    pub(crate) fn release(&mut self, cursor: CursorId) -> bool {
        let Some(slot) = self.slots.remove(&cursor) else {
            return false;
        };
        if let Some(n) = self.node_mut(slot.node) {
            n.cursors.retain(|c| *c != cursor);
        }
        self.collapse(slot.node);
        trace!(cursor = ?cursor, "released cursor");
        true
    }

    pub(crate) fn cursor_count(&self) -> usize {
        self.slots.len()
    }

    /// Live nodes, the root included.
    pub(crate) fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }
}

fn alias(key: &Key) -> Option<Key> {
    match key {
        Key::Index(i) => Some(Key::Name(i.to_string())),
        Key::Name(_) => key.to_index().map(Key::Index),
        Key::Symbol(_) => None,
    }
}
