//! The contract every concrete widget implements to plug into the runtime.
//!
//! A widget is shared behaviour for one component instance (`Rc<dyn Widget>`);
//! per-instance state lives in the component's property bag. Every method has
//! a default except [`Widget::widget_type`], so the smallest widget is a
//! unit struct naming its type.

use super::instance::Component;
use super::pipeline::Pipeline;
use super::properties::{ChangeSet, Properties};
use crate::error::{PaintError, RuntimeError};
use crate::surface::{NodeId, Surface};
use crate::value::Value;

/// Core trait implemented by all widgets.
pub trait Widget {
    /// Type name (e.g. "Button", "Table"). Used for markup resolution,
    /// diagnostics and the type class.
    fn widget_type(&self) -> &str;

    /// Produce the main node when the caller didn't supply one.
    fn create_main(&self, surface: &mut Surface, _options: &Properties) -> NodeId {
        surface.create_element("div")
    }

    /// Normalize raw construction options into the property bag. Called once,
    /// while the component is still `NEW`.
    fn init_options(&self, component: &Component, options: Properties) -> Result<(), RuntimeError> {
        component.set_properties(options).map(drop)
    }

    /// Build child nodes under the main node.
    fn init_structure(&self, _component: &Component) -> Result<(), RuntimeError> {
        Ok(())
    }

    /// Subscribe DOM events through the delegation subsystem.
    fn init_events(&self, _component: &Component) -> Result<(), RuntimeError> {
        Ok(())
    }

    /// The composed painter list for this widget type.
    fn pipeline(&self) -> Pipeline {
        Pipeline::base()
    }

    /// Repaint `component`. `None` means paint everything.
    ///
    /// Override to chain an extra pass over the changes the pipeline left
    /// unpainted.
    fn repaint(
        &self,
        component: &Component,
        changes: Option<&ChangeSet>,
    ) -> Result<ChangeSet, PaintError> {
        self.pipeline().run(component, changes)
    }

    /// Per-property equality used by the diff engine.
    fn is_property_changed(&self, _name: &str, old: &Value, new: &Value) -> bool {
        old != new
    }

    /// States during which input delivered through the delegation subsystem
    /// is ignored.
    fn ignore_states(&self) -> &[&str] {
        &["disabled"]
    }
}
