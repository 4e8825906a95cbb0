//! Node types: NodeId, NodeData.

use std::collections::BTreeMap;

use slotmap::new_key_type;

use crate::error::RuntimeError;

new_key_type! {
    /// Unique identifier for a surface node. Copy, lightweight (u64).
    pub struct NodeId;
}

/// Data associated with a single surface node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeData {
    /// Element tag (e.g. "div", "viewport").
    pub tag: String,
    /// Optional element id.
    pub id: Option<String>,
    /// Classes, in insertion order.
    pub classes: Vec<String>,
    /// Attributes, sorted by name.
    pub attributes: BTreeMap<String, String>,
    /// Optional text content.
    pub text: Option<String>,
}

impl NodeData {
    /// Create a new `NodeData` with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Set the element id (builder).
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a single class (builder). Empty names are ignored.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        if !class.is_empty() && !self.classes.contains(&class) {
            self.classes.push(class);
        }
        self
    }

    /// Set an attribute (builder).
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the text content (builder).
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Check whether this node has a given class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Add a class. No-op if already present; an empty name is a contract
    /// violation.
    pub fn add_class(&mut self, class: &str) -> Result<(), RuntimeError> {
        if class.is_empty() {
            return Err(RuntimeError::EmptyClassName);
        }
        if !self.has_class(class) {
            self.classes.push(class.to_owned());
        }
        Ok(())
    }

    /// Remove a class. No-op if not present.
    pub fn remove_class(&mut self, class: &str) -> Result<(), RuntimeError> {
        if class.is_empty() {
            return Err(RuntimeError::EmptyClassName);
        }
        self.classes.retain(|c| c != class);
        Ok(())
    }

    /// Toggle a class: add if absent, remove if present.
    pub fn toggle_class(&mut self, class: &str) -> Result<(), RuntimeError> {
        if self.has_class(class) {
            self.remove_class(class)
        } else {
            self.add_class(class)
        }
    }

    /// Read an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_defaults() {
        let data = NodeData::new("div");
        assert_eq!(data.tag, "div");
        assert!(data.id.is_none());
        assert!(data.classes.is_empty());
        assert!(data.attributes.is_empty());
    }

    #[test]
    fn builder_with_class_dedup() {
        let data = NodeData::new("div").with_class("a").with_class("a").with_class("");
        assert_eq!(data.classes, vec!["a"]);
    }

    #[test]
    fn builder_attr_and_text() {
        let data = NodeData::new("span").with_attr("data-ui", "type:Label").with_text("hi");
        assert_eq!(data.attr("data-ui"), Some("type:Label"));
        assert_eq!(data.text.as_deref(), Some("hi"));
    }

    #[test]
    fn add_class_idempotent() {
        let mut data = NodeData::new("div");
        data.add_class("foo").unwrap();
        data.add_class("foo").unwrap();
        assert_eq!(data.classes.len(), 1);
    }

    #[test]
    fn empty_class_is_rejected() {
        let mut data = NodeData::new("div");
        assert!(matches!(data.add_class(""), Err(RuntimeError::EmptyClassName)));
        assert!(matches!(data.remove_class(""), Err(RuntimeError::EmptyClassName)));
    }

    #[test]
    fn toggle_class() {
        let mut data = NodeData::new("div");
        data.toggle_class("active").unwrap();
        assert!(data.has_class("active"));
        data.toggle_class("active").unwrap();
        assert!(!data.has_class("active"));
    }

    #[test]
    fn node_id_is_copy() {
        fn assert_copy<T: Copy>() {}
        assert_copy::<NodeId>();
    }
}
