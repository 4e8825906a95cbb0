//! Tree operations: create, append, remove, walk; global singleton nodes.

use std::collections::VecDeque;

use slotmap::{SecondaryMap, SlotMap};

use super::listener::{ListenerId, ListenerTable, RawCallback};
use super::node::{NodeData, NodeId};
use crate::error::RuntimeError;

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[NodeId] = &[];

/// The retained node tree, backed by a slotmap arena.
///
/// All nodes live in a single `SlotMap`. Parent/child relationships are stored
/// in secondary maps so that node removal is O(subtree size) and lookup is O(1).
/// `viewport`, `document` and `body` always exist and are the recognized global
/// singletons; `body` is a child of `document`.
pub struct Surface {
    pub(crate) nodes: SlotMap<NodeId, NodeData>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
    parent: SecondaryMap<NodeId, NodeId>,
    viewport: NodeId,
    document: NodeId,
    body: NodeId,
    listeners: ListenerTable,
}

impl Surface {
    /// Create a surface holding only the global singleton nodes.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let mut children = SecondaryMap::new();
        let mut parent = SecondaryMap::new();
        let viewport = nodes.insert(NodeData::new("viewport"));
        let document = nodes.insert(NodeData::new("document"));
        let body = nodes.insert(NodeData::new("body"));
        children.insert(viewport, Vec::new());
        children.insert(document, vec![body]);
        children.insert(body, Vec::new());
        parent.insert(body, document);
        Self {
            nodes,
            children,
            parent,
            viewport,
            document,
            body,
            listeners: ListenerTable::new(),
        }
    }

    pub fn viewport(&self) -> NodeId {
        self.viewport
    }

    pub fn document(&self) -> NodeId {
        self.document
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    /// Whether `node` is one of the recognized global singletons.
    pub fn is_global(&self, node: NodeId) -> bool {
        node == self.viewport || node == self.document || node == self.body
    }

    /// Create a detached node.
    pub fn create(&mut self, data: NodeData) -> NodeId {
        let id = self.nodes.insert(data);
        self.children.insert(id, Vec::new());
        id
    }

    /// Create a detached element with the given tag.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.create(NodeData::new(tag))
    }

    /// Create a node as the last child of `parent`.
    pub fn insert_child(&mut self, parent: NodeId, data: NodeData) -> Result<NodeId, RuntimeError> {
        if !self.nodes.contains_key(parent) {
            return Err(RuntimeError::MissingNode(parent));
        }
        let id = self.create(data);
        self.attach(id, parent);
        Ok(id)
    }

    /// Move `node` to become the last child of `new_parent`.
    ///
    /// The node keeps its subtree intact. If `node` was previously a child of
    /// another parent, it is detached first.
    pub fn append_child(&mut self, new_parent: NodeId, node: NodeId) -> Result<(), RuntimeError> {
        for id in [node, new_parent] {
            if !self.nodes.contains_key(id) {
                return Err(RuntimeError::MissingNode(id));
            }
        }
        self.detach(node);
        self.attach(node, new_parent);
        Ok(())
    }

    fn attach(&mut self, node: NodeId, parent: NodeId) {
        self.parent.insert(node, parent);
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.push(node);
        }
    }

    /// Detach `node` from its parent, keeping it (and its subtree) alive.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent_id) = self.parent.remove(node) {
            if let Some(siblings) = self.children.get_mut(parent_id) {
                siblings.retain(|&child| child != node);
            }
        }
    }

    /// Remove a node and all its descendants, detaching their raw listeners.
    ///
    /// Global singletons cannot be removed. Returns the `NodeData` for the
    /// removed node, or `None` if it didn't exist.
    pub fn remove(&mut self, id: NodeId) -> Option<NodeData> {
        if !self.nodes.contains_key(id) || self.is_global(id) {
            return None;
        }
        self.detach(id);

        let mut to_remove = VecDeque::new();
        to_remove.push_back(id);
        let mut removed_root_data = None;

        while let Some(current) = to_remove.pop_front() {
            if let Some(kids) = self.children.remove(current) {
                to_remove.extend(kids);
            }
            self.parent.remove(current);
            self.listeners.remove_node(current);
            let data = self.nodes.remove(current);
            if current == id {
                removed_root_data = data;
            }
        }

        removed_root_data
    }

    /// Get the parent of a node, if it has one.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// Get the children of a node. Returns an empty slice if the node has no
    /// children or does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Walk from `id` up to the root, collecting ancestor node ids (nearest
    /// first, `id` excluded).
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    /// `[start, parent, ..., root]`, or empty if `start` does not exist.
    pub fn bubble_path(&self, start: NodeId) -> Vec<NodeId> {
        if !self.contains(start) {
            return Vec::new();
        }
        let mut path = vec![start];
        path.extend(self.ancestors(start));
        path
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn contains_node(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).contains(&ancestor)
    }

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, RuntimeError> {
        self.nodes.get_mut(id).ok_or(RuntimeError::MissingNode(id))
    }

    /// Number of nodes, global singletons included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: the global singletons exist for the surface's lifetime.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Pre-order depth-first traversal starting from `start`.
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            // Reverse so the first child is visited first.
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    // ── Attributes and classes ───────────────────────────────────────

    pub fn set_attribute(
        &mut self,
        node: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), RuntimeError> {
        self.node_mut(node)?
            .attributes
            .insert(name.to_owned(), value.into());
        Ok(())
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes.get(node).and_then(|data| data.attr(name))
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Option<String> {
        self.nodes
            .get_mut(node)
            .and_then(|data| data.attributes.remove(name))
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) -> Result<(), RuntimeError> {
        self.node_mut(node)?.add_class(class)
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) -> Result<(), RuntimeError> {
        self.node_mut(node)?.remove_class(class)
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes.get(node).is_some_and(|data| data.has_class(class))
    }

    // ── Raw listeners ────────────────────────────────────────────────

    /// Attach a raw listener.
    pub fn listen(
        &mut self,
        node: NodeId,
        kind: &str,
        callback: RawCallback,
    ) -> Result<ListenerId, RuntimeError> {
        if !self.contains(node) {
            return Err(RuntimeError::MissingNode(node));
        }
        Ok(self.listeners.add(node, kind, callback))
    }

    /// Detach a raw listener. Returns `false` if it was already gone.
    pub fn unlisten(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn has_listener(&self, id: ListenerId) -> bool {
        self.listeners.contains(id)
    }

    /// Number of raw listeners for `kind` on `node`.
    pub fn listener_count(&self, node: NodeId, kind: &str) -> usize {
        self.listeners.count(node, kind)
    }

    /// Total number of raw listeners on the surface.
    pub fn total_listeners(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn listeners_for(&self, node: NodeId, kind: &str) -> Vec<(ListenerId, RawCallback)> {
        self.listeners.snapshot(node, kind)
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("nodes", &self.nodes.len())
            .field("listeners", &self.listeners)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    /// Build a small test tree under body:
    /// ```text
    ///      body
    ///        |
    ///      root
    ///      /   \
    ///    a       b
    ///   / \
    ///  c   d
    /// ```
    fn build_tree() -> (Surface, NodeId, NodeId, NodeId, NodeId, NodeId) {
        let mut surface = Surface::new();
        let body = surface.body();
        let root = surface.insert_child(body, NodeData::new("div").with_id("root")).unwrap();
        let a = surface.insert_child(root, NodeData::new("div").with_id("a")).unwrap();
        let b = surface.insert_child(root, NodeData::new("div").with_id("b")).unwrap();
        let c = surface.insert_child(a, NodeData::new("span").with_id("c")).unwrap();
        let d = surface.insert_child(a, NodeData::new("span").with_id("d")).unwrap();
        (surface, root, a, b, c, d)
    }

    #[test]
    fn new_surface_has_globals() {
        let surface = Surface::new();
        assert_eq!(surface.len(), 3);
        assert!(surface.is_global(surface.viewport()));
        assert!(surface.is_global(surface.document()));
        assert!(surface.is_global(surface.body()));
        assert_eq!(surface.parent(surface.body()), Some(surface.document()));
        assert_eq!(surface.parent(surface.viewport()), None);
    }

    #[test]
    fn created_nodes_are_not_global() {
        let mut surface = Surface::new();
        let node = surface.create_element("div");
        assert!(!surface.is_global(node));
        assert_eq!(surface.parent(node), None);
    }

    #[test]
    fn children_and_ancestors() {
        let (surface, root, a, b, c, d) = build_tree();
        assert_eq!(surface.children(root), &[a, b]);
        assert_eq!(surface.children(a), &[c, d]);
        assert_eq!(
            surface.ancestors(c),
            vec![a, root, surface.body(), surface.document()]
        );
    }

    #[test]
    fn bubble_path_includes_start() {
        let (surface, root, a, _, c, _) = build_tree();
        let path = surface.bubble_path(c);
        assert_eq!(&path[..3], &[c, a, root]);
    }

    #[test]
    fn insert_child_into_missing_parent_fails() {
        let (mut surface, _, _, _, c, _) = build_tree();
        surface.remove(c);
        assert!(matches!(
            surface.insert_child(c, NodeData::new("x")),
            Err(RuntimeError::MissingNode(_))
        ));
    }

    #[test]
    fn remove_subtree_detaches_listeners() {
        let (mut surface, root, a, b, c, _) = build_tree();
        surface.listen(c, "click", Rc::new(|_| {})).unwrap();
        surface.listen(b, "click", Rc::new(|_| {})).unwrap();
        surface.remove(a);
        assert!(!surface.contains(a));
        assert!(!surface.contains(c));
        assert_eq!(surface.children(root), &[b]);
        assert_eq!(surface.total_listeners(), 1);
    }

    #[test]
    fn globals_cannot_be_removed() {
        let mut surface = Surface::new();
        let body = surface.body();
        assert!(surface.remove(body).is_none());
        assert!(surface.contains(body));
    }

    #[test]
    fn append_child_reparents() {
        let (mut surface, _root, a, b, c, _d) = build_tree();
        surface.append_child(b, c).unwrap();
        assert_eq!(surface.parent(c), Some(b));
        assert!(!surface.children(a).contains(&c));
        assert!(surface.contains_node(b, c));
        assert!(!surface.contains_node(a, c));
    }

    #[test]
    fn walk_depth_first() {
        let (surface, root, a, b, c, d) = build_tree();
        assert_eq!(surface.walk_depth_first(root), vec![root, a, c, d, b]);
    }

    #[test]
    fn attributes_and_classes() {
        let (mut surface, root, ..) = build_tree();
        surface.set_attribute(root, "data-x", "1").unwrap();
        assert_eq!(surface.attribute(root, "data-x"), Some("1"));
        assert_eq!(surface.remove_attribute(root, "data-x").as_deref(), Some("1"));
        surface.add_class(root, "on").unwrap();
        assert!(surface.has_class(root, "on"));
        assert!(surface.add_class(root, "").is_err());
        surface.remove_class(root, "on").unwrap();
        assert!(!surface.has_class(root, "on"));
    }

    #[test]
    fn listen_on_missing_node_fails() {
        let (mut surface, _, _, _, c, _) = build_tree();
        surface.remove(c);
        assert!(surface.listen(c, "click", Rc::new(|_| {})).is_err());
    }
}
