//! View contexts: instance registries with named groups and safe lookup.

pub mod group;
pub mod lookup;
pub mod view_context;

pub use group::ControlGroup;
pub use lookup::Lookup;
pub use view_context::ViewContext;
pub(crate) use view_context::ContextInner;
