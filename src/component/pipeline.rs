//! Repaint pipelines: ordered painters keyed by the properties they watch.
//!
//! A widget type's pipeline is its base type's pipeline with more painters
//! appended ([`Pipeline::extend`]); the result is a flat list, never a chain
//! of delegations. Running a pipeline with a change set invokes only the
//! painters that watch a changed name and returns the changes nobody painted.

use std::fmt;
use std::rc::Rc;

use super::instance::Component;
use super::properties::ChangeSet;
use crate::error::{BoxError, PaintError};
use crate::value::Value;

/// Painter callback: receives the component and the current values of the
/// watched names, in declaration order.
pub type PaintFn = dyn Fn(&Component, &[Value]) -> Result<(), BoxError>;

/// A declarative unit of rendering logic.
#[derive(Clone)]
pub struct Painter {
    names: Vec<String>,
    paint: Rc<PaintFn>,
}

impl Painter {
    /// Create a painter watching `names`.
    pub fn new<I, S>(
        names: I,
        paint: impl Fn(&Component, &[Value]) -> Result<(), BoxError> + 'static,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            paint: Rc::new(paint),
        }
    }

    /// Painter that maps a truthy/falsy property onto a component state.
    pub fn state(name: &str, state: &'static str) -> Self {
        Painter::new([name], move |component, values| {
            if values[0].is_truthy() {
                component.add_state(state)?;
            } else {
                component.remove_state(state)?;
            }
            Ok(())
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    fn should_paint(&self, changes: Option<&ChangeSet>) -> bool {
        match changes {
            None => true,
            Some(changes) => self.names.iter().any(|name| changes.contains(name)),
        }
    }
}

impl fmt::Debug for Painter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Painter").field("names", &self.names).finish()
    }
}

/// A composed, ordered, shareable list of painters.
#[derive(Clone)]
pub struct Pipeline {
    painters: Rc<[Painter]>,
}

impl Pipeline {
    pub fn new(painters: impl IntoIterator<Item = Painter>) -> Self {
        Self {
            painters: painters.into_iter().collect(),
        }
    }

    /// Painters every component gets: `disabled`, `hidden` and `readOnly`
    /// toggle the matching component states.
    pub fn base() -> Self {
        Pipeline::new([
            Painter::state("disabled", "disabled"),
            Painter::state("hidden", "hidden"),
            Painter::state("readOnly", "readonly"),
        ])
    }

    /// `self`'s painters followed by `painters`.
    pub fn extend(&self, painters: impl IntoIterator<Item = Painter>) -> Self {
        Pipeline::new(self.painters.iter().cloned().chain(painters))
    }

    /// Concatenate pipelines in order.
    pub fn compose(pipelines: impl IntoIterator<Item = Pipeline>) -> Self {
        Pipeline::new(
            pipelines
                .into_iter()
                .flat_map(|pipeline| pipeline.painters.to_vec()),
        )
    }

    pub fn painters(&self) -> &[Painter] {
        &self.painters
    }

    pub fn len(&self) -> usize {
        self.painters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.painters.is_empty()
    }

    /// Run the pipeline against `component`.
    ///
    /// `None` paints everything. Otherwise a painter runs iff one of its
    /// watched names is in `changes`. Returns the changes no painter consumed.
    /// The first failing painter aborts the run.
    pub fn run(
        &self,
        component: &Component,
        changes: Option<&ChangeSet>,
    ) -> Result<ChangeSet, PaintError> {
        let mut unpainted = changes.cloned().unwrap_or_default();
        for painter in self.painters.iter() {
            if !painter.should_paint(changes) {
                continue;
            }
            let values: Vec<Value> = painter
                .names
                .iter()
                .map(|name| component.get(name))
                .collect();
            for name in &painter.names {
                unpainted.remove(name);
            }
            tracing::trace!(id = %component.id(), names = ?painter.names, "painting");
            (painter.paint)(component, &values).map_err(|source| PaintError {
                names: painter.names.clone(),
                id: component.id(),
                widget_type: component.widget_type().to_owned(),
                source,
            })?;
        }
        Ok(unpainted)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Pipeline::new([])
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.painters.iter()).finish()
    }
}
