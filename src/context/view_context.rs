//! The instance registry: id → component, plus named groups.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

use super::group::ControlGroup;
use super::lookup::Lookup;
use crate::component::Component;
use crate::error::RuntimeError;
use crate::runtime::{Runtime, RuntimeInner};

pub(crate) struct ContextInner {
    id: String,
    runtime: Weak<RuntimeInner>,
    controls: RefCell<HashMap<String, Component>>,
    groups: RefCell<HashMap<String, HashSet<String>>>,
    disposed: Cell<bool>,
}

/// A registry of live components keyed by id.
///
/// Ids are unique within one context: adding a component under an id that a
/// different component holds evicts the holder.
#[derive(Clone)]
pub struct ViewContext {
    inner: Rc<ContextInner>,
}

impl ViewContext {
    pub(crate) fn new(id: String, runtime: &Runtime) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                id,
                runtime: runtime.downgrade(),
                controls: RefCell::new(HashMap::new()),
                groups: RefCell::new(HashMap::new()),
                disposed: Cell::new(false),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<ContextInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<ContextInner> {
        Rc::downgrade(&self.inner)
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn ptr_eq(&self, other: &ViewContext) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Register `component` under its id and link it to this context.
    pub fn add(&self, component: &Component) {
        if self.is_disposed() || component.is_disposed() {
            return;
        }
        let id = component.id();
        let existing = self.inner.controls.borrow().get(&id).cloned();
        match existing {
            Some(existing) if existing.ptr_eq(component) => return,
            Some(existing) => {
                tracing::warn!(context = self.id(), id = %id, "evicting component holding id");
                self.remove(&existing);
            }
            None => {}
        }

        self.inner
            .controls
            .borrow_mut()
            .insert(id.clone(), component.clone());
        {
            let mut groups = self.inner.groups.borrow_mut();
            for group in component.groups() {
                groups.entry(group).or_default().insert(id.clone());
            }
        }
        component.set_view_context(Some(self));
    }

    /// Unregister `component` if it is the one registered under its id.
    pub fn remove(&self, component: &Component) {
        let id = component.id();
        let removed = {
            let mut controls = self.inner.controls.borrow_mut();
            match controls.get(&id) {
                Some(current) if current.ptr_eq(component) => controls.remove(&id).is_some(),
                _ => false,
            }
        };
        if removed {
            let mut groups = self.inner.groups.borrow_mut();
            for members in groups.values_mut() {
                members.remove(&id);
            }
            groups.retain(|_, members| !members.is_empty());
        }
        component.unlink_context(self);
    }

    pub fn get(&self, id: &str) -> Option<Component> {
        self.inner.controls.borrow().get(id).cloned()
    }

    /// Lookup that never fails: a missing id yields [`Lookup::Missing`],
    /// whose component API is inert.
    pub fn get_safely(&self, id: &str) -> Lookup {
        match self.get(id) {
            Some(component) => Lookup::Found(component),
            None => Lookup::Missing,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.controls.borrow().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.controls.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.controls.borrow().is_empty()
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.controls.borrow().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Registered components, sorted by id.
    pub fn components(&self) -> Vec<Component> {
        self.ids().iter().filter_map(|id| self.get(id)).collect()
    }

    /// Members of the group called `name`.
    pub fn group(&self, name: &str) -> Result<ControlGroup, RuntimeError> {
        if name.is_empty() {
            return Err(RuntimeError::EmptyGroupName);
        }
        let ids: Vec<String> = self
            .inner
            .groups
            .borrow()
            .get(name)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default();
        Ok(ControlGroup::new(self.clone(), ids))
    }

    /// Names of the non-empty groups, sorted.
    pub fn group_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.groups.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    /// Dispose every registered component and forget the groups. Idempotent.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        let components: Vec<Component> =
            self.inner.controls.borrow().values().cloned().collect();
        for component in components {
            component.dispose();
        }
        self.inner.controls.borrow_mut().clear();
        self.inner.groups.borrow_mut().clear();
        if let Some(runtime) = Runtime::upgrade(&self.inner.runtime) {
            runtime.forget_context(self.id());
        }
        tracing::debug!(context = self.id(), "view context disposed");
    }
}

impl fmt::Debug for ViewContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewContext")
            .field("id", &self.id())
            .field("ids", &self.ids())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Properties, Widget};
    use pretty_assertions::assert_eq;

    struct Field;

    impl Widget for Field {
        fn widget_type(&self) -> &str {
            "Field"
        }
    }

    fn field(runtime: &Runtime, context: &ViewContext, props: Properties) -> Component {
        runtime
            .create_in(Rc::new(Field), context, props)
            .unwrap()
    }

    #[test]
    fn components_register_by_id() {
        let runtime = Runtime::new();
        let context = runtime.create_view_context("form");
        let a = field(&runtime, &context, Properties::new().with("id", "a"));
        assert!(context.get("a").unwrap().ptr_eq(&a));
        assert!(a.view_context().unwrap().ptr_eq(&context));
        assert_eq!(context.ids(), vec!["a"]);
        assert!(runtime.default_context().is_empty());
    }

    #[test]
    fn same_id_evicts_previous_holder() {
        let runtime = Runtime::new();
        let context = runtime.create_view_context("form");
        let first = field(&runtime, &context, Properties::new().with("id", "name"));
        let second = field(&runtime, &context, Properties::new().with("id", "name"));
        assert!(context.get("name").unwrap().ptr_eq(&second));
        assert!(first.view_context().is_none());
        assert!(!first.is_disposed());
    }

    #[test]
    fn moving_between_contexts() {
        let runtime = Runtime::new();
        let a = runtime.create_view_context("a");
        let b = runtime.create_view_context("b");
        let c = field(&runtime, &a, Properties::new().with("id", "x"));
        c.set_properties(Properties::new().with_view_context(Some(&b)))
            .unwrap();
        assert!(!a.contains("x"));
        assert!(b.contains("x"));
        c.set_view_context(None);
        assert!(b.is_empty());
    }

    #[test]
    fn groups_track_membership() {
        let runtime = Runtime::new();
        let context = runtime.create_view_context("g");
        field(&runtime, &context, Properties::new().with("id", "a").with("group", "req"));
        field(&runtime, &context, Properties::new().with("id", "b").with("group", "req opt"));
        let b = context.get("b").unwrap();
        assert_eq!(context.group("req").unwrap().len(), 2);
        assert_eq!(context.group_names(), vec!["opt", "req"]);

        context.remove(&b);
        assert_eq!(context.group("req").unwrap().ids(), vec!["a"]);
        assert!(context.group("opt").unwrap().is_empty());
        assert!(matches!(context.group(""), Err(RuntimeError::EmptyGroupName)));
    }

    #[test]
    fn dispose_disposes_members_once() {
        let runtime = Runtime::new();
        let context = runtime.create_view_context("d");
        let a = field(&runtime, &context, Properties::new().with("id", "a"));
        let b = field(&runtime, &context, Properties::new().with("id", "b"));
        context.dispose();
        context.dispose();
        assert!(a.is_disposed() && b.is_disposed());
        assert!(context.is_empty());
        assert!(runtime.view_context("d").is_none());

        let late = field(&runtime, &context, Properties::new().with("id", "late"));
        assert!(late.view_context().is_none());
        assert!(context.is_empty());
    }
}
