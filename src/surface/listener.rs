//! Raw listener table: the low-level subscriptions attached to surface nodes.
//!
//! A raw listener is what a host platform would call a native event listener.
//! The event delegation layer keeps their number small by pooling; tests
//! observe pooling through [`ListenerTable::count`].

use std::collections::HashMap;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

use super::node::NodeId;
use crate::event::DomEvent;

new_key_type! {
    /// Handle to a raw listener.
    pub struct ListenerId;
}

/// Callback invoked for a raw event.
pub type RawCallback = Rc<dyn Fn(&mut DomEvent)>;

struct RawListener {
    node: NodeId,
    kind: String,
    callback: RawCallback,
}

/// Raw listeners keyed by (node, kind), kept in attachment order.
#[derive(Default)]
pub struct ListenerTable {
    entries: SlotMap<ListenerId, RawListener>,
    index: HashMap<(NodeId, String), Vec<ListenerId>>,
}

impl ListenerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a listener for `kind` on `node`.
    pub fn add(&mut self, node: NodeId, kind: &str, callback: RawCallback) -> ListenerId {
        let id = self.entries.insert(RawListener {
            node,
            kind: kind.to_owned(),
            callback,
        });
        self.index
            .entry((node, kind.to_owned()))
            .or_default()
            .push(id);
        id
    }

    /// Detach a listener. Returns `false` if it was already gone.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let Some(listener) = self.entries.remove(id) else {
            return false;
        };
        let key = (listener.node, listener.kind);
        if let Some(ids) = self.index.get_mut(&key) {
            ids.retain(|&other| other != id);
            if ids.is_empty() {
                self.index.remove(&key);
            }
        }
        true
    }

    /// Whether a listener is still attached.
    pub fn contains(&self, id: ListenerId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of listeners attached for `kind` on `node`.
    pub fn count(&self, node: NodeId, kind: &str) -> usize {
        self.index
            .get(&(node, kind.to_owned()))
            .map_or(0, Vec::len)
    }

    /// Total number of attached listeners.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy out the listeners for (node, kind) so they can be invoked without
    /// holding a borrow of the table.
    pub fn snapshot(&self, node: NodeId, kind: &str) -> Vec<(ListenerId, RawCallback)> {
        self.index
            .get(&(node, kind.to_owned()))
            .map(|ids| {
                ids.iter()
                    .filter_map(|&id| {
                        self.entries
                            .get(id)
                            .map(|listener| (id, Rc::clone(&listener.callback)))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Detach every listener attached to `node`.
    pub fn remove_node(&mut self, node: NodeId) -> usize {
        let ids: Vec<ListenerId> = self
            .entries
            .iter()
            .filter(|(_, listener)| listener.node == node)
            .map(|(id, _)| id)
            .collect();
        let removed = ids.len();
        for id in ids {
            self.remove(id);
        }
        removed
    }
}

impl std::fmt::Debug for ListenerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerTable")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn node_ids(n: usize) -> Vec<NodeId> {
        let mut sm: SlotMap<NodeId, ()> = SlotMap::with_key();
        (0..n).map(|_| sm.insert(())).collect()
    }

    #[test]
    fn add_and_count() {
        let nodes = node_ids(2);
        let mut table = ListenerTable::new();
        table.add(nodes[0], "click", Rc::new(|_| {}));
        table.add(nodes[0], "click", Rc::new(|_| {}));
        table.add(nodes[1], "click", Rc::new(|_| {}));
        assert_eq!(table.count(nodes[0], "click"), 2);
        assert_eq!(table.count(nodes[1], "click"), 1);
        assert_eq!(table.count(nodes[1], "keydown"), 0);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn remove_is_idempotent() {
        let nodes = node_ids(1);
        let mut table = ListenerTable::new();
        let id = table.add(nodes[0], "click", Rc::new(|_| {}));
        assert!(table.remove(id));
        assert!(!table.remove(id));
        assert_eq!(table.count(nodes[0], "click"), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn snapshot_preserves_order() {
        let nodes = node_ids(1);
        let mut table = ListenerTable::new();
        let hits = Rc::new(Cell::new(0u32));
        let h1 = Rc::clone(&hits);
        let h2 = Rc::clone(&hits);
        let first = table.add(nodes[0], "click", Rc::new(move |_| h1.set(h1.get() * 10 + 1)));
        let second = table.add(nodes[0], "click", Rc::new(move |_| h2.set(h2.get() * 10 + 2)));
        let snapshot = table.snapshot(nodes[0], "click");
        assert_eq!(
            snapshot.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
            vec![first, second]
        );
        let mut event = DomEvent::new("click");
        for (_, callback) in snapshot {
            callback(&mut event);
        }
        assert_eq!(hits.get(), 12);
    }

    #[test]
    fn remove_node_detaches_all_kinds() {
        let nodes = node_ids(2);
        let mut table = ListenerTable::new();
        table.add(nodes[0], "click", Rc::new(|_| {}));
        table.add(nodes[0], "keydown", Rc::new(|_| {}));
        table.add(nodes[1], "click", Rc::new(|_| {}));
        assert_eq!(table.remove_node(nodes[0]), 2);
        assert_eq!(table.len(), 1);
    }
}
