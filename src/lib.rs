//! # trellis
//!
//! A declarative component runtime for interactive widget trees.
//!
//! trellis gives widgets a fixed contract and takes care of the rest: component
//! identity, a four-stage lifecycle, property diffing with incremental repaint,
//! pooled and delegated event dispatch, and instance registries with safe
//! lookup. Components render into a retained node arena (the *surface*), and
//! terminal input arrives through crossterm.
//!
//! ## Core Systems
//!
//! - **[`component`]**: Components, lifecycle stages, property diffing, painter pipelines, notifications
//! - **[`event`]**: DOM events, per-component delegation, pooled global listeners, debounce timers, input
//! - **[`context`]**: View contexts: id registry, groups, safe lookup
//! - **[`extension`]**: Extension protocol and render hooks
//! - **[`markup`]**: `key:value;...` declarations bound to components
//! - **[`surface`]**: Slotmap-backed node arena with raw listeners and bubbling
//! - **[`runtime`]**: The runtime tying everything together
//! - **[`value`]**: Dynamically typed property values
//!
//! ## Example
//!
//! ```
//! use std::rc::Rc;
//! use trellis::{Painter, Pipeline, Properties, Runtime, Widget};
//!
//! struct Label;
//!
//! impl Widget for Label {
//!     fn widget_type(&self) -> &str {
//!         "Label"
//!     }
//!
//!     fn pipeline(&self) -> Pipeline {
//!         Pipeline::base().extend([Painter::new(["text"], |c, values| {
//!             let main = c.main().ok_or("no main node")?;
//!             let text = values[0].to_string();
//!             c.runtime()?.with_surface_mut(|s| {
//!                 if let Some(node) = s.get_mut(main) {
//!                     node.text = Some(text);
//!                 }
//!             });
//!             Ok(())
//!         })])
//!     }
//! }
//!
//! let runtime = Runtime::new();
//! runtime.register_widget("Label", Rc::new(|| Rc::new(Label) as Rc<dyn Widget>))?;
//! let label = runtime.create("Label", Properties::new().with("id", "greeting").with("text", "hi"))?;
//! label.render()?;
//! label.set("text", "hello")?;
//!
//! let found = runtime.default_context().get_safely("greeting");
//! assert_eq!(found.get("text").to_string(), "hello");
//! # Ok::<(), trellis::RuntimeError>(())
//! ```

// Foundation
pub mod config;
pub mod error;
pub mod value;

// Node arena
pub mod surface;

// Components
pub mod component;
pub mod context;
pub mod extension;

// Events
pub mod event;

// Binding and runtime
pub mod markup;
pub mod runtime;

pub use component::{
    Accessor, ChangeRecord, ChangeSet, Component, Notification, Options, Painter, Pipeline,
    Properties, RenderPhase, Stage, Widget,
};
pub use config::RuntimeConfig;
pub use context::{ControlGroup, Lookup, ViewContext};
pub use error::{BoxError, PaintError, RuntimeError};
pub use event::{DomEvent, EventDetail};
pub use extension::{Extension, ExtensionFactory, ExtensionHandle};
pub use markup::{InitOptions, MarkupError};
pub use runtime::{Runtime, WidgetFactory};
pub use surface::{NodeData, NodeId, Surface};
pub use value::Value;
