//! Batch operations over a named group of components.

use super::view_context::ViewContext;
use crate::component::{Component, Properties};
use crate::error::RuntimeError;

/// A snapshot of a group's members, resolved against its view context on
/// every operation. Members disposed since the snapshot are skipped.
#[derive(Debug, Clone)]
pub struct ControlGroup {
    context: ViewContext,
    ids: Vec<String>,
}

impl ControlGroup {
    pub(crate) fn new(context: ViewContext, mut ids: Vec<String>) -> Self {
        ids.sort();
        Self { context, ids }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Live members, in id order.
    pub fn components(&self) -> Vec<Component> {
        self.ids
            .iter()
            .filter_map(|id| self.context.get(id))
            .collect()
    }

    pub fn for_each(&self, mut f: impl FnMut(&Component)) {
        for component in self.components() {
            f(&component);
        }
    }

    /// Apply `properties` to every member. Stops at the first failure.
    pub fn set_properties(&self, properties: &Properties) -> Result<(), RuntimeError> {
        for component in self.components() {
            component.set_properties(properties.clone())?;
        }
        Ok(())
    }

    pub fn disable(&self) -> Result<(), RuntimeError> {
        self.set_properties(&Properties::new().with("disabled", true))
    }

    pub fn enable(&self) -> Result<(), RuntimeError> {
        self.set_properties(&Properties::new().with("disabled", false))
    }

    pub fn show(&self) -> Result<(), RuntimeError> {
        self.set_properties(&Properties::new().with("hidden", false))
    }

    pub fn hide(&self) -> Result<(), RuntimeError> {
        self.set_properties(&Properties::new().with("hidden", true))
    }
}
