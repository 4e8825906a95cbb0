//! Runtime configuration.
//!
//! [`RuntimeConfig`] is a plain value handed to [`crate::Runtime::new`]. Every
//! field has a default; builder methods override individual fields.

use std::time::Duration;

/// Default debounce delay for pooled `resize` / `scroll` listeners.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(150);

/// Configuration for a [`crate::Runtime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Delay applied to debounced pooled events.
    pub debounce: Duration,
    /// Event kinds whose pooled listeners are debounced.
    pub debounced_kinds: Vec<String>,
    /// Attribute holding `key:value;...` declarations for markup binding.
    pub markup_attr: String,
    /// Attribute written on a component's main node holding its id.
    pub instance_attr: String,
    /// Attribute written on a component's main node holding its view context id.
    pub context_attr: String,
    /// Prefix for the type and state classes the runtime writes.
    pub class_prefix: String,
    /// Id of the lazily created default view context.
    pub default_context_id: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            debounced_kinds: vec!["resize".to_owned(), "scroll".to_owned()],
            markup_attr: "data-ui".to_owned(),
            instance_attr: "data-ctrl-id".to_owned(),
            context_attr: "data-ctrl-view-context".to_owned(),
            class_prefix: "ui".to_owned(),
            default_context_id: "default".to_owned(),
        }
    }
}

impl RuntimeConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the debounce delay (builder).
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Replace the set of debounced event kinds (builder).
    pub fn with_debounced_kinds(
        mut self,
        kinds: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.debounced_kinds = kinds.into_iter().map(Into::into).collect();
        self
    }

    /// Set the markup declaration attribute (builder).
    pub fn with_markup_attr(mut self, attr: impl Into<String>) -> Self {
        self.markup_attr = attr.into();
        self
    }

    /// Set the instance id attribute (builder).
    pub fn with_instance_attr(mut self, attr: impl Into<String>) -> Self {
        self.instance_attr = attr.into();
        self
    }

    /// Set the view context id attribute (builder).
    pub fn with_context_attr(mut self, attr: impl Into<String>) -> Self {
        self.context_attr = attr.into();
        self
    }

    /// Set the class prefix (builder).
    pub fn with_class_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.class_prefix = prefix.into();
        self
    }

    /// Set the default view context id (builder).
    pub fn with_default_context_id(mut self, id: impl Into<String>) -> Self {
        self.default_context_id = id.into();
        self
    }

    /// Whether pooled listeners for `kind` are debounced.
    pub fn is_debounced(&self, kind: &str) -> bool {
        self.debounced_kinds.iter().any(|k| k == kind)
    }

    /// Class written for a widget type, e.g. `ui-button`.
    pub fn type_class(&self, widget_type: &str) -> String {
        format!("{}-{}", self.class_prefix, widget_type.to_ascii_lowercase())
    }

    /// Class written for a state of a widget type, e.g. `ui-button-disabled`.
    pub fn state_class(&self, widget_type: &str, state: &str) -> String {
        format!("{}-{}", self.type_class(widget_type), state)
    }

    /// Class written for a skin, e.g. `skin-flat`.
    pub fn skin_class(&self, skin: &str) -> String {
        format!("skin-{skin}")
    }
}
