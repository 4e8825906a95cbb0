//! Pluggable behaviour attached to components.
//!
//! An [`Extension`] is activated against one target component at a time.
//! The runtime wraps each attached extension in an [`ExtensionHandle`] that
//! tracks the current target and whether it is active, so re-targeting
//! always inactivates against the old target first.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::component::{Component, WeakComponent};
use crate::error::RuntimeError;

/// Behaviour plugged into a component.
///
/// Extensions typically register render hooks or notification handlers in
/// [`Extension::activate`] and undo them in [`Extension::inactivate`].
pub trait Extension {
    /// Extension kind. A component carries at most one extension per kind.
    fn kind(&self) -> &str;

    fn activate(&self, _target: &Component) -> Result<(), RuntimeError> {
        Ok(())
    }

    fn inactivate(&self, _target: &Component) {}
}

/// Produces a fresh extension for every new component.
pub type ExtensionFactory = Rc<dyn Fn() -> Rc<dyn Extension>>;

struct ExtensionState {
    extension: Rc<dyn Extension>,
    target: RefCell<Option<WeakComponent>>,
    active: Cell<bool>,
}

/// An extension bound to (at most) one target.
#[derive(Clone)]
pub struct ExtensionHandle {
    state: Rc<ExtensionState>,
}

impl ExtensionHandle {
    pub fn new(extension: Rc<dyn Extension>) -> Self {
        Self {
            state: Rc::new(ExtensionState {
                extension,
                target: RefCell::new(None),
                active: Cell::new(false),
            }),
        }
    }

    pub fn kind(&self) -> &str {
        self.state.extension.kind()
    }

    pub fn ptr_eq(&self, other: &ExtensionHandle) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub fn extension(&self) -> Rc<dyn Extension> {
        Rc::clone(&self.state.extension)
    }

    pub fn is_active(&self) -> bool {
        self.state.active.get()
    }

    pub fn target(&self) -> Option<Component> {
        self.state
            .target
            .borrow()
            .as_ref()
            .and_then(WeakComponent::upgrade)
    }

    /// Point the extension at `target`, inactivating it against any previous
    /// target first, then activate.
    pub fn attach_to(&self, target: &Component) -> Result<(), RuntimeError> {
        if let Some(current) = self.target() {
            if current.ptr_eq(target) && self.is_active() {
                return Ok(());
            }
            if self.is_active() {
                self.inactivate();
            }
        }
        *self.state.target.borrow_mut() = Some(target.downgrade());
        self.state.extension.activate(target)?;
        self.state.active.set(true);
        tracing::trace!(kind = self.kind(), id = %target.id(), "extension activated");
        Ok(())
    }

    /// Inactivate against the current target, keeping the target link.
    pub fn inactivate(&self) {
        if !self.state.active.replace(false) {
            return;
        }
        if let Some(target) = self.target() {
            self.state.extension.inactivate(&target);
        }
    }

    /// Inactivate and forget the target.
    pub fn dispose(&self) {
        self.inactivate();
        *self.state.target.borrow_mut() = None;
    }
}

impl fmt::Debug for ExtensionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionHandle")
            .field("kind", &self.kind())
            .field("active", &self.is_active())
            .field("target", &self.target().map(|c| c.id()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Properties, Widget};
    use crate::runtime::Runtime;
    use pretty_assertions::assert_eq;

    struct Plain;

    impl Widget for Plain {
        fn widget_type(&self) -> &str {
            "Plain"
        }
    }

    /// Records activate/inactivate calls by target id.
    struct Tracker {
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Extension for Tracker {
        fn kind(&self) -> &str {
            "tracker"
        }

        fn activate(&self, target: &Component) -> Result<(), RuntimeError> {
            self.log.borrow_mut().push(format!("on:{}", target.id()));
            Ok(())
        }

        fn inactivate(&self, target: &Component) {
            self.log.borrow_mut().push(format!("off:{}", target.id()));
        }
    }

    fn plain(runtime: &Runtime, id: &str) -> Component {
        Component::new(runtime, Rc::new(Plain), Properties::new().with("id", id)).unwrap()
    }

    #[test]
    fn retarget_inactivates_old_target_first() {
        let runtime = Runtime::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let handle = ExtensionHandle::new(Rc::new(Tracker {
            log: Rc::clone(&log),
        }));
        let a = plain(&runtime, "a");
        let b = plain(&runtime, "b");
        handle.attach_to(&a).unwrap();
        handle.attach_to(&a).unwrap();
        handle.attach_to(&b).unwrap();
        assert!(handle.target().unwrap().ptr_eq(&b));
        handle.dispose();
        assert!(!handle.is_active());
        assert!(handle.target().is_none());
        assert_eq!(*log.borrow(), vec!["on:a", "off:a", "on:b", "off:b"]);
    }

    #[test]
    fn component_keeps_one_extension_per_kind() {
        let runtime = Runtime::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let c = plain(&runtime, "c");
        let first = Rc::new(Tracker {
            log: Rc::clone(&log),
        });
        let second = Rc::new(Tracker {
            log: Rc::clone(&log),
        });
        assert!(c.use_extension(first).unwrap());
        assert!(!c.use_extension(second).unwrap());
        assert_eq!(c.extensions().len(), 1);

        c.dispose();
        assert_eq!(*log.borrow(), vec!["on:c", "off:c"]);
    }

    /// Fails to activate, as an extension missing a required node would.
    struct Refusing;

    impl Extension for Refusing {
        fn kind(&self) -> &str {
            "tracker"
        }

        fn activate(&self, _target: &Component) -> Result<(), RuntimeError> {
            Err(RuntimeError::EmptyGroupName)
        }
    }

    #[test]
    fn failed_activation_leaves_the_kind_free() {
        let runtime = Runtime::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let c = plain(&runtime, "c");
        assert!(c.use_extension(Rc::new(Refusing)).is_err());
        assert!(c.extensions().is_empty());

        let tracker = Rc::new(Tracker {
            log: Rc::clone(&log),
        });
        assert!(c.use_extension(tracker).unwrap());
        let handles = c.extensions();
        assert_eq!(handles.len(), 1);
        assert!(handles[0].is_active());
        assert_eq!(*log.borrow(), vec!["on:c"]);
    }

    #[test]
    fn global_factories_apply_to_new_components() {
        let runtime = Runtime::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        runtime.register_global_extension(Rc::new(move || {
            Rc::new(Tracker {
                log: Rc::clone(&sink),
            }) as Rc<dyn Extension>
        }));
        let c = plain(&runtime, "g");
        assert_eq!(c.extensions()[0].kind(), "tracker");
        assert_eq!(*log.borrow(), vec!["on:g"]);
        assert!(c.remove_extension("tracker").is_some());
        assert!(c.extensions().is_empty());
        assert_eq!(*log.borrow(), vec!["on:g", "off:g"]);
    }
}
