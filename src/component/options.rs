//! Construction options.

use std::fmt;
use std::rc::Rc;

use super::properties::Properties;
use crate::context::ViewContext;
use crate::extension::Extension;
use crate::surface::NodeId;

/// Everything a component is constructed from.
#[derive(Clone, Default)]
pub struct Options {
    /// Initial property bag, handed to `Widget::init_options`.
    pub properties: Properties,
    /// Existing main node; `Widget::create_main` is used when `None`.
    pub main: Option<NodeId>,
    /// View context to join; the runtime's default context when `None`.
    pub view_context: Option<ViewContext>,
    /// Extensions to attach, first of each kind wins.
    pub extensions: Vec<Rc<dyn Extension>>,
}

impl Options {
    pub fn new(properties: Properties) -> Self {
        Self {
            properties,
            ..Self::default()
        }
    }

    /// Use an existing main node (builder).
    pub fn with_main(mut self, main: NodeId) -> Self {
        self.main = Some(main);
        self
    }

    /// Join `context` instead of the default one (builder).
    pub fn with_view_context(mut self, context: &ViewContext) -> Self {
        self.view_context = Some(context.clone());
        self
    }

    /// Attach an extension (builder).
    pub fn with_extension(mut self, extension: Rc<dyn Extension>) -> Self {
        self.extensions.push(extension);
        self
    }
}

impl From<Properties> for Options {
    fn from(properties: Properties) -> Self {
        Options::new(properties)
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("properties", &self.properties)
            .field("main", &self.main)
            .field("view_context", &self.view_context.as_ref().map(ViewContext::id))
            .field(
                "extensions",
                &self.extensions.iter().map(|e| e.kind().to_owned()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
