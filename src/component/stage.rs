//! Lifecycle stages: NEW → INITED → RENDERED → DISPOSED.
//!
//! Stage names double as string keys (markup, diagnostics, `is_in_stage`), so
//! parsing is strict: an unknown name is an error rather than a silent
//! mismatch.

use std::cell::Cell;
use std::fmt;
use std::str::FromStr;

use crate::error::RuntimeError;

/// Lifecycle stage of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    New = 0,
    Inited = 1,
    Rendered = 2,
    Disposed = 3,
}

impl Stage {
    /// All stages in order.
    pub const ALL: [Stage; 4] = [Stage::New, Stage::Inited, Stage::Rendered, Stage::Disposed];

    /// Canonical upper-case name.
    pub fn name(self) -> &'static str {
        match self {
            Stage::New => "NEW",
            Stage::Inited => "INITED",
            Stage::Rendered => "RENDERED",
            Stage::Disposed => "DISPOSED",
        }
    }

    /// Numeric code, in transition order.
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.name() == s)
            .ok_or_else(|| RuntimeError::UnknownStage(s.to_owned()))
    }
}

/// Forward-only stage holder.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    stage: Cell<Stage>,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            stage: Cell::new(Stage::New),
        }
    }

    pub(crate) fn get(&self) -> Stage {
        self.stage.get()
    }

    /// Move to `to` if it lies ahead of the current stage.
    ///
    /// Returns `false` (and leaves the stage alone) for regressions and
    /// repeated transitions.
    pub(crate) fn advance(&self, to: Stage) -> bool {
        if to > self.stage.get() {
            self.stage.set(to);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_names() {
        for stage in Stage::ALL {
            assert_eq!(stage.name().parse::<Stage>().unwrap(), stage);
        }
    }

    #[test]
    fn parse_rejects_unknown_and_lowercase() {
        assert!(matches!(
            "RENDERD".parse::<Stage>(),
            Err(RuntimeError::UnknownStage(name)) if name == "RENDERD"
        ));
        assert!("rendered".parse::<Stage>().is_err());
        assert!("".parse::<Stage>().is_err());
    }

    #[test]
    fn codes_are_ordered() {
        let codes: Vec<u8> = Stage::ALL.iter().map(|s| s.code()).collect();
        assert_eq!(codes, vec![0, 1, 2, 3]);
        assert!(Stage::Inited < Stage::Rendered);
    }

    #[test]
    fn lifecycle_only_moves_forward() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.get(), Stage::New);
        assert!(lifecycle.advance(Stage::Inited));
        assert!(!lifecycle.advance(Stage::Inited));
        assert!(lifecycle.advance(Stage::Rendered));
        assert!(!lifecycle.advance(Stage::New));
        assert_eq!(lifecycle.get(), Stage::Rendered);
        assert!(lifecycle.advance(Stage::Disposed));
        assert!(!lifecycle.advance(Stage::Rendered));
        assert_eq!(lifecycle.get(), Stage::Disposed);
    }
}
