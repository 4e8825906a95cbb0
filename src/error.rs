//! Error types.
//!
//! Contract violations (a caller or integration bug) surface as
//! [`RuntimeError`] immediately. Painter failures are wrapped into a
//! [`PaintError`] that names the component and the properties being painted.
//! Looking up a missing component is not an error at all, see
//! [`crate::context::Lookup`].

use crate::component::Stage;
use crate::markup::MarkupError;
use crate::surface::NodeId;

/// Boxed error returned by painters, render hooks and event handlers.
pub type BoxError = Box<dyn std::error::Error + 'static>;

/// A painter failed while repainting a component.
#[derive(Debug, thiserror::Error)]
#[error("failed to paint [{}] for component \"{id}\" of type {widget_type}: {source}", quoted(.names))]
pub struct PaintError {
    /// Property names the failing painter watches.
    pub names: Vec<String>,
    /// Id of the component being painted.
    pub id: String,
    /// Widget type of the component being painted.
    pub widget_type: String,
    /// The painter's own error.
    #[source]
    pub source: BoxError,
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("\"{n}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised by the runtime.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("unknown lifecycle stage \"{0}\"")]
    UnknownStage(String),

    #[error("class name must not be empty")]
    EmptyClassName,

    #[error("state name must not be empty")]
    EmptyStateName,

    #[error("group name must not be empty")]
    EmptyGroupName,

    #[error("cannot {operation} on component \"{id}\" while it is {stage}")]
    StageViolation {
        operation: &'static str,
        id: String,
        stage: Stage,
    },

    #[error("widget type \"{0}\" is already registered")]
    DuplicateWidget(String),

    #[error("no widget registered for type \"{0}\"")]
    UnknownWidget(String),

    #[error("component \"{child}\" cannot be added under its own descendant \"{parent}\"")]
    CyclicChild { parent: String, child: String },

    #[error("surface node {0:?} does not exist")]
    MissingNode(NodeId),

    #[error("the runtime owning this component has been dropped")]
    RuntimeGone,

    #[error(transparent)]
    Paint(#[from] PaintError),

    #[error(transparent)]
    Markup(#[from] MarkupError),

    #[error("{context}: {source}")]
    Hook {
        context: String,
        #[source]
        source: BoxError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paint_error_names_component_and_properties() {
        let err = PaintError {
            names: vec!["width".into(), "height".into()],
            id: "grid".into(),
            widget_type: "Table".into(),
            source: "column overflow".into(),
        };
        insta::assert_snapshot!(
            err.to_string(),
            @r#"failed to paint ["width", "height"] for component "grid" of type Table: column overflow"#
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn stage_violation_message() {
        let err = RuntimeError::StageViolation {
            operation: "wire events",
            id: "a".into(),
            stage: Stage::Inited,
        };
        insta::assert_snapshot!(err.to_string(), @r#"cannot wire events on component "a" while it is INITED"#);
    }

    #[test]
    fn paint_error_converts_into_runtime_error() {
        let err: RuntimeError = PaintError {
            names: vec!["x".into()],
            id: "c".into(),
            widget_type: "W".into(),
            source: "boom".into(),
        }
        .into();
        assert!(matches!(err, RuntimeError::Paint(_)));
        assert!(err.to_string().contains("\"x\""));
    }
}
