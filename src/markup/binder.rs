//! Construct components from markup found on the surface.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::{kebab_to_camel, parse_declarations, MarkupError};
use crate::component::{is_reserved, Component, Options, Properties};
use crate::context::ViewContext;
use crate::error::RuntimeError;
use crate::runtime::Runtime;
use crate::surface::NodeId;
use crate::value::Value;

/// Turns a raw markup value into a property value.
pub type ValueReplacer = Rc<dyn Fn(&str) -> Value>;

/// Options for [`Runtime::init`].
#[derive(Clone, Default)]
pub struct InitOptions {
    /// Context for top-level components; nested ones use their parent's.
    pub view_context: Option<ViewContext>,
    /// Parent for components with no bound ancestor.
    pub parent: Option<Component>,
    /// Property overrides keyed by component id, merged over the markup.
    pub properties: HashMap<String, Properties>,
    /// Defaults to [`Value::parse_literal`].
    pub value_replacer: Option<ValueReplacer>,
}

impl InitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_view_context(mut self, context: &ViewContext) -> Self {
        self.view_context = Some(context.clone());
        self
    }

    pub fn with_parent(mut self, parent: &Component) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    pub fn with_properties(mut self, id: impl Into<String>, properties: Properties) -> Self {
        self.properties.insert(id.into(), properties);
        self
    }

    pub fn with_value_replacer(mut self, replacer: impl Fn(&str) -> Value + 'static) -> Self {
        self.value_replacer = Some(Rc::new(replacer));
        self
    }

    fn replace(&self, raw: &str) -> Value {
        match &self.value_replacer {
            Some(replacer) => replacer(raw),
            None => Value::parse_literal(raw),
        }
    }
}

impl fmt::Debug for InitOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitOptions")
            .field("view_context", &self.view_context.as_ref().map(ViewContext::id))
            .field("parent", &self.parent.as_ref().map(Component::id))
            .field("properties", &self.properties)
            .field("value_replacer", &self.value_replacer.is_some())
            .finish()
    }
}

/// A parsed markup declaration block.
struct Binding {
    widget_type: String,
    child_name: Option<String>,
    properties: Properties,
}

impl Runtime {
    /// Bind every unbound markup node under `root` (inclusive), in document
    /// order. Each component is built and rendered before its subtree is
    /// scanned, so nodes a render creates are bound too.
    pub fn init(&self, root: NodeId, options: InitOptions) -> Result<Vec<Component>, RuntimeError> {
        if !self.with_surface(|surface| surface.contains(root)) {
            return Err(RuntimeError::MissingNode(root));
        }
        let mut created: Vec<Component> = Vec::new();
        let mut by_node: HashMap<NodeId, Component> = HashMap::new();
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            if let Some(binding) = self.read_binding(node, &options)? {
                let component = self.bind(node, binding, &by_node, &options)?;
                by_node.insert(node, component.clone());
                created.push(component);
            }
            let children = self.with_surface(|surface| surface.children(node).to_vec());
            stack.extend(children.into_iter().rev());
        }
        tracing::debug!(?root, count = created.len(), "bound markup");
        Ok(created)
    }

    fn read_binding(
        &self,
        node: NodeId,
        options: &InitOptions,
    ) -> Result<Option<Binding>, RuntimeError> {
        let config = self.config();
        let attributes = self.with_surface(|surface| {
            surface
                .get(node)
                .filter(|data| !data.attributes.contains_key(&config.instance_attr))
                .filter(|data| data.attributes.contains_key(&config.markup_attr))
                .map(|data| data.attributes.clone())
        });
        let Some(attributes) = attributes else {
            return Ok(None);
        };

        let mut widget_type = None;
        let mut child_name = None;
        let mut properties = Properties::new();
        let declared = attributes
            .get(&config.markup_attr)
            .map(String::as_str)
            .unwrap_or_default();
        let prefix = format!("{}-", config.markup_attr);
        let expanded = attributes.iter().filter_map(|(name, value)| {
            name.strip_prefix(&prefix)
                .map(|key| (kebab_to_camel(key), value.clone()))
        });
        for (key, raw) in parse_declarations(declared)?.into_iter().chain(expanded) {
            match key.as_str() {
                "type" => widget_type = Some(raw),
                "childName" => child_name = Some(raw),
                _ if is_reserved(&key) => properties.insert(key, Value::Str(raw)),
                _ => properties.insert(key, options.replace(&raw)),
            }
        }

        let widget_type = widget_type
            .filter(|t| !t.is_empty())
            .ok_or(MarkupError::MissingType { node })?;
        if let Some(overrides) = properties
            .get("id")
            .map(Value::to_string)
            .and_then(|id| options.properties.get(&id))
        {
            properties.merge(overrides.clone());
        }
        Ok(Some(Binding {
            widget_type,
            child_name,
            properties,
        }))
    }

    fn bind(
        &self,
        node: NodeId,
        binding: Binding,
        by_node: &HashMap<NodeId, Component>,
        options: &InitOptions,
    ) -> Result<Component, RuntimeError> {
        let parent = self
            .with_surface(|surface| surface.ancestors(node))
            .into_iter()
            .find_map(|ancestor| by_node.get(&ancestor).cloned())
            .or_else(|| options.parent.clone());
        let context = parent
            .as_ref()
            .and_then(Component::view_context)
            .or_else(|| options.view_context.clone());

        let mut component_options = Options::new(binding.properties).with_main(node);
        if let Some(context) = &context {
            component_options = component_options.with_view_context(context);
        }
        let component = self.create_with(&binding.widget_type, component_options)?;
        if let Some(parent) = &parent {
            parent.add_child(&component, binding.child_name.as_deref())?;
        }
        component.render()?;
        Ok(component)
    }
}
