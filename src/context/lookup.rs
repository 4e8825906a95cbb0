//! Lookups that tolerate dangling references.
//!
//! `ViewContext::get_safely` returns a [`Lookup`]. Callers may match on it,
//! or call the component API directly: on [`Lookup::Missing`] every mutator
//! is a no-op, boolean queries answer `false` and value queries return
//! `Value::Null` or `None`.

use crate::component::{ChangeSet, Component, Notification, Properties, Stage, SubscriptionId};
use crate::error::RuntimeError;
use crate::surface::NodeId;
use crate::value::Value;

#[derive(Debug, Clone)]
pub enum Lookup {
    Found(Component),
    Missing,
}

impl Lookup {
    pub fn found(&self) -> Option<&Component> {
        match self {
            Lookup::Found(component) => Some(component),
            Lookup::Missing => None,
        }
    }

    pub fn into_found(self) -> Option<Component> {
        match self {
            Lookup::Found(component) => Some(component),
            Lookup::Missing => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Lookup::Missing)
    }

    pub fn id(&self) -> Option<String> {
        self.found().map(Component::id)
    }

    pub fn stage(&self) -> Option<Stage> {
        self.found().map(Component::stage)
    }

    pub fn get(&self, name: &str) -> Value {
        self.found().map(|c| c.get(name)).unwrap_or_default()
    }

    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<ChangeSet, RuntimeError> {
        match self.found() {
            Some(component) => component.set(name, value),
            None => Ok(ChangeSet::new()),
        }
    }

    pub fn set_properties(&self, properties: Properties) -> Result<ChangeSet, RuntimeError> {
        match self.found() {
            Some(component) => component.set_properties(properties),
            None => Ok(ChangeSet::new()),
        }
    }

    pub fn render(&self) -> Result<(), RuntimeError> {
        match self.found() {
            Some(component) => component.render(),
            None => Ok(()),
        }
    }

    pub fn dispose(&self) {
        if let Some(component) = self.found() {
            component.dispose();
        }
    }

    pub fn destroy(&self) {
        if let Some(component) = self.found() {
            component.destroy();
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.found().is_some_and(Component::is_disabled)
    }

    pub fn is_hidden(&self) -> bool {
        self.found().is_some_and(Component::is_hidden)
    }

    pub fn is_read_only(&self) -> bool {
        self.found().is_some_and(Component::is_read_only)
    }

    pub fn is_disposed(&self) -> bool {
        self.found().is_some_and(Component::is_disposed)
    }

    pub fn has_state(&self, state: &str) -> bool {
        self.found().is_some_and(|c| c.has_state(state))
    }

    pub fn disable(&self) -> Result<ChangeSet, RuntimeError> {
        self.set("disabled", true)
    }

    pub fn enable(&self) -> Result<ChangeSet, RuntimeError> {
        self.set("disabled", false)
    }

    pub fn show(&self) -> Result<ChangeSet, RuntimeError> {
        self.set("hidden", false)
    }

    pub fn hide(&self) -> Result<ChangeSet, RuntimeError> {
        self.set("hidden", true)
    }

    pub fn main(&self) -> Option<NodeId> {
        self.found().and_then(Component::main)
    }

    pub fn child(&self, name: &str) -> Lookup {
        self.found()
            .and_then(|c| c.child(name))
            .map_or(Lookup::Missing, Lookup::Found)
    }

    pub fn parent(&self) -> Lookup {
        self.found()
            .and_then(Component::parent)
            .map_or(Lookup::Missing, Lookup::Found)
    }

    pub fn fire(&self, kind: &str, payload: impl Into<Value>) {
        if let Some(component) = self.found() {
            component.fire(kind, payload);
        }
    }

    /// Subscribe when found; `None` when missing.
    pub fn on(
        &self,
        kind: &str,
        handler: impl Fn(&Component, &Notification) + 'static,
    ) -> Option<SubscriptionId> {
        self.found().map(|component| component.on(kind, handler))
    }
}

impl From<Option<Component>> for Lookup {
    fn from(component: Option<Component>) -> Self {
        component.map_or(Lookup::Missing, Lookup::Found)
    }
}
