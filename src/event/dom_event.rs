//! The event object passed through raw listeners and delegated handlers.

use super::input::{Key, Modifiers, MouseBtn};
use crate::surface::NodeId;
use crate::value::Value;

/// Kind-specific payload of a [`DomEvent`].
#[derive(Debug, Clone, Default, PartialEq)]
pub enum EventDetail {
    #[default]
    None,
    Key {
        key: Key,
        modifiers: Modifiers,
    },
    Pointer {
        x: u16,
        y: u16,
        button: Option<MouseBtn>,
        modifiers: Modifiers,
    },
    Resize {
        width: u16,
        height: u16,
    },
    Scroll {
        delta_x: i16,
        delta_y: i16,
    },
    Text(String),
    Value(Value),
}

/// An event travelling through the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent {
    kind: String,
    target: Option<NodeId>,
    current_target: Option<NodeId>,
    detail: EventDetail,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl DomEvent {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            target: None,
            current_target: None,
            detail: EventDetail::None,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// Attach a payload (builder).
    pub fn with_detail(mut self, detail: EventDetail) -> Self {
        self.detail = detail;
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The node the event was dispatched at.
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }

    /// The node whose listener is currently running.
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target
    }

    pub fn detail(&self) -> &EventDetail {
        &self.detail
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Stop the event from bubbling past the current node.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    pub(crate) fn set_target(&mut self, node: NodeId) {
        self.target = Some(node);
    }

    pub(crate) fn set_current_target(&mut self, node: Option<NodeId>) {
        self.current_target = node;
    }

    /// Detached copy for deferred delivery: same kind, target and detail,
    /// fresh flags.
    pub fn snapshot(&self) -> DomEvent {
        DomEvent {
            kind: self.kind.clone(),
            target: self.target,
            current_target: None,
            detail: self.detail.clone(),
            default_prevented: false,
            propagation_stopped: false,
        }
    }
}
