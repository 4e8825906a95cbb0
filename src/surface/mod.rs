//! Surface: slotmap-backed node arena, global singleton nodes, raw listeners.
//!
//! The surface is the retained tree components render into. Three nodes are
//! created up front and recognized as global singletons (`viewport`,
//! `document`, `body`); every other node is an arbitrary element.

pub mod listener;
pub mod node;
pub mod query;
pub mod tree;

pub use listener::{ListenerId, RawCallback};
pub use node::{NodeData, NodeId};
pub use tree::Surface;
