//! Surface queries: by id, class, attribute; generic predicate matching.

use super::node::{NodeData, NodeId};
use super::tree::Surface;

impl Surface {
    /// Find the first node whose `id` field matches the given string.
    ///
    /// Iterates all nodes in the arena, detached ones included.
    pub fn query_by_id(&self, id: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, data)| data.id.as_deref() == Some(id))
            .map(|(node_id, _)| node_id)
    }

    /// Find all nodes that have the given class.
    pub fn query_by_class(&self, class: &str) -> Vec<NodeId> {
        self.query_all(|data| data.has_class(class))
    }

    /// Find all nodes matching an arbitrary predicate, in arena order.
    pub fn query_all(&self, predicate: impl Fn(&NodeData) -> bool) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, data)| predicate(data))
            .map(|(node_id, _)| node_id)
            .collect()
    }

    /// Nodes in the subtree of `root` (inclusive) carrying `attr`, in document
    /// order.
    pub fn query_attr_in(&self, root: NodeId, attr: &str) -> Vec<NodeId> {
        self.walk_depth_first(root)
            .into_iter()
            .filter(|&node| self.attribute(node, attr).is_some())
            .collect()
    }
}
