//! Component instances: identity, lifecycle, property diffing, ownership.
//!
//! A [`Component`] is a cheap, cloneable handle. The runtime keeps only weak
//! links to it; view contexts and parents keep strong ones. No `RefCell`
//! borrow is held while widget code, painters, hooks or handlers run, so all
//! of them may call back into the component.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::{Rc, Weak};

use super::notify::{self, Notification, Notifier, SubscriptionId};
use super::options::Options;
use super::pipeline::Pipeline;
use super::properties::{Accessor, ChangeRecord, ChangeSet, Properties, PropertyBag, RESERVED_KEYS};
use super::stage::{Lifecycle, Stage};
use super::widget::Widget;
use crate::context::{ContextInner, ViewContext};
use crate::error::{BoxError, RuntimeError};
use crate::event::delegate::DomEventTable;
use crate::extension::{Extension, ExtensionHandle};
use crate::runtime::{ComponentKey, Runtime, RuntimeInner};
use crate::surface::NodeId;
use crate::value::Value;

/// When a render hook runs during the initial render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderPhase {
    /// After `Widget::init_structure`.
    Structure,
    /// After `Widget::init_events`.
    Events,
}

/// Hook added by extensions (or callers) to extend a component's build.
pub type RenderHook = Rc<dyn Fn(&Component) -> Result<(), BoxError>>;

pub(crate) struct ComponentInner {
    key: ComponentKey,
    widget: Rc<dyn Widget>,
    runtime: Weak<RuntimeInner>,
    lifecycle: Lifecycle,
    rendering: Cell<bool>,
    built: Cell<bool>,
    disposing: Cell<bool>,
    id: RefCell<String>,
    skin: RefCell<Option<String>>,
    groups: RefCell<Vec<String>>,
    properties: RefCell<PropertyBag>,
    accessors: RefCell<HashMap<String, Accessor>>,
    states: RefCell<BTreeSet<String>>,
    main: Cell<Option<NodeId>>,
    parent: RefCell<Weak<ComponentInner>>,
    children: RefCell<Vec<Component>>,
    child_name: RefCell<Option<String>>,
    context: RefCell<Weak<ContextInner>>,
    extensions: RefCell<Vec<ExtensionHandle>>,
    pub(crate) dom_events: RefCell<DomEventTable>,
    notifier: RefCell<Notifier>,
    hooks: RefCell<Vec<(RenderPhase, RenderHook)>>,
}

/// Handle to a component instance.
#[derive(Clone)]
pub struct Component {
    pub(crate) inner: Rc<ComponentInner>,
}

/// Non-owning handle, for closures that must not keep a component alive.
#[derive(Clone)]
pub struct WeakComponent {
    inner: Weak<ComponentInner>,
}

impl WeakComponent {
    pub fn upgrade(&self) -> Option<Component> {
        self.inner.upgrade().map(|inner| Component { inner })
    }
}

impl fmt::Debug for WeakComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WeakComponent")
            .field(&self.upgrade().map(|c| c.id()))
            .finish()
    }
}

impl Component {
    /// Construct a component from a property bag.
    pub fn new(
        runtime: &Runtime,
        widget: Rc<dyn Widget>,
        properties: Properties,
    ) -> Result<Self, RuntimeError> {
        Self::with_options(runtime, widget, Options::new(properties))
    }

    /// Construct a component: main node, id, options, view context,
    /// extensions, then `INITED` and the `init` notification.
    pub fn with_options(
        runtime: &Runtime,
        widget: Rc<dyn Widget>,
        options: Options,
    ) -> Result<Self, RuntimeError> {
        let Options {
            properties,
            main,
            view_context,
            extensions,
        } = options;

        let main = match main {
            Some(node) => {
                if !runtime.with_surface(|s| s.contains(node)) {
                    return Err(RuntimeError::MissingNode(node));
                }
                node
            }
            None => runtime.with_surface_mut(|s| widget.create_main(s, &properties)),
        };

        let id = format!("ctrl-{}", runtime.next_guid());
        let key = runtime.inner.components.borrow_mut().insert(Weak::new());
        let component = Component {
            inner: Rc::new(ComponentInner {
                key,
                widget,
                runtime: Rc::downgrade(&runtime.inner),
                lifecycle: Lifecycle::new(),
                rendering: Cell::new(false),
                built: Cell::new(false),
                disposing: Cell::new(false),
                id: RefCell::new(id),
                skin: RefCell::new(None),
                groups: RefCell::new(Vec::new()),
                properties: RefCell::new(PropertyBag::default()),
                accessors: RefCell::new(HashMap::new()),
                states: RefCell::new(BTreeSet::new()),
                main: Cell::new(Some(main)),
                parent: RefCell::new(Weak::new()),
                children: RefCell::new(Vec::new()),
                child_name: RefCell::new(None),
                context: RefCell::new(Weak::new()),
                extensions: RefCell::new(Vec::new()),
                dom_events: RefCell::new(DomEventTable::default()),
                notifier: RefCell::new(Notifier::default()),
                hooks: RefCell::new(Vec::new()),
            }),
        };
        if let Some(slot) = runtime.inner.components.borrow_mut().get_mut(key) {
            *slot = Rc::downgrade(&component.inner);
        }

        if let Err(err) = component.initialize(runtime, properties, view_context, extensions) {
            component.dispose();
            return Err(err);
        }
        Ok(component)
    }

    fn initialize(
        &self,
        runtime: &Runtime,
        properties: Properties,
        view_context: Option<ViewContext>,
        extensions: Vec<Rc<dyn Extension>>,
    ) -> Result<(), RuntimeError> {
        let widget = Rc::clone(&self.inner.widget);
        widget.init_options(self, properties)?;

        if self.view_context().is_none() {
            let context = match view_context {
                Some(context) => context,
                None => runtime.default_context(),
            };
            self.set_view_context(Some(&context));
        }

        let factories = runtime.global_extensions();
        let all = extensions
            .into_iter()
            .chain(factories.iter().map(|factory| factory()));
        for extension in all {
            self.use_extension(extension)?;
        }

        self.inner.lifecycle.advance(Stage::Inited);
        tracing::debug!(id = %self.id(), widget_type = self.widget_type(), "component inited");
        self.fire(notify::INIT, Value::Null);
        Ok(())
    }

    // ── Identity ─────────────────────────────────────────────────────

    pub fn id(&self) -> String {
        self.inner.id.borrow().clone()
    }

    pub fn widget_type(&self) -> &str {
        self.inner.widget.widget_type()
    }

    pub fn widget(&self) -> Rc<dyn Widget> {
        Rc::clone(&self.inner.widget)
    }

    pub fn skin(&self) -> Option<String> {
        self.inner.skin.borrow().clone()
    }

    /// Groups this component declared membership in.
    pub fn groups(&self) -> Vec<String> {
        self.inner.groups.borrow().clone()
    }

    pub fn main(&self) -> Option<NodeId> {
        self.inner.main.get()
    }

    pub fn ptr_eq(&self, other: &Component) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakComponent {
        WeakComponent {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub(crate) fn key(&self) -> ComponentKey {
        self.inner.key
    }

    pub(crate) fn from_inner(inner: Rc<ComponentInner>) -> Self {
        Self { inner }
    }

    /// The runtime this component belongs to.
    pub fn runtime(&self) -> Result<Runtime, RuntimeError> {
        Runtime::upgrade(&self.inner.runtime).ok_or(RuntimeError::RuntimeGone)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    pub fn stage(&self) -> Stage {
        self.inner.lifecycle.get()
    }

    /// Whether the component is in the stage called `name`.
    pub fn is_in_stage(&self, name: &str) -> Result<bool, RuntimeError> {
        Ok(self.stage() == name.parse::<Stage>()?)
    }

    /// Move to the stage called `name`. Only forward moves take effect; the
    /// return value tells whether the stage changed.
    pub fn change_stage(&self, name: &str) -> Result<bool, RuntimeError> {
        let stage: Stage = name.parse()?;
        Ok(self.inner.lifecycle.advance(stage))
    }

    pub fn is_disposed(&self) -> bool {
        self.stage() == Stage::Disposed
    }

    /// Whether the initial render is in progress.
    pub fn is_rendering(&self) -> bool {
        self.inner.rendering.get()
    }

    /// Build (first call) and paint the component.
    ///
    /// From `INITED`: structure, hooks, events, instance attributes and
    /// classes, full repaint, then `RENDERED` and `afterrender`. From
    /// `RENDERED`: full repaint only. No-op once disposed.
    pub fn render(&self) -> Result<(), RuntimeError> {
        match self.stage() {
            Stage::Disposed | Stage::New => return Ok(()),
            Stage::Rendered => {
                self.repaint(None)?;
                return Ok(());
            }
            Stage::Inited => {}
        }
        if self.inner.rendering.get() || self.inner.disposing.get() {
            return Ok(());
        }

        self.inner.rendering.set(true);
        let painted = self.build_once().and_then(|()| self.repaint(None).map(drop));
        self.inner.rendering.set(false);
        painted?;

        if self.inner.lifecycle.advance(Stage::Rendered) {
            tracing::debug!(id = %self.id(), widget_type = self.widget_type(), "component rendered");
            self.fire(notify::AFTER_RENDER, Value::Null);
        }
        Ok(())
    }

    /// Build unless an earlier render already did. A failed build is rolled
    /// back so the next render starts clean; a failed repaint keeps the build.
    fn build_once(&self) -> Result<(), RuntimeError> {
        if self.inner.built.get() {
            return Ok(());
        }
        match self.build() {
            Ok(()) => {
                self.inner.built.set(true);
                Ok(())
            }
            Err(err) => {
                tracing::debug!(id = %self.id(), error = %err, "build failed, rolling back");
                self.unbuild();
                Err(err)
            }
        }
    }

    /// Drop the DOM handlers, instance attributes and runtime classes a
    /// partial build left behind.
    fn unbuild(&self) {
        self.clear_dom_events(None);
        let (Ok(runtime), Some(main)) = (self.runtime(), self.main()) else {
            return;
        };
        let config = runtime.config();
        let mut classes = vec![config.type_class(self.widget_type())];
        if let Some(skin) = self.skin() {
            classes.push(config.skin_class(&skin));
        }
        for state in self.states() {
            classes.push(config.state_class(self.widget_type(), &state));
        }
        runtime.with_surface_mut(|surface| {
            surface.remove_attribute(main, &config.instance_attr);
            surface.remove_attribute(main, &config.context_attr);
            for class in &classes {
                // names are non-empty and a missing node has nothing to undo
                let _ = surface.remove_class(main, class);
            }
        });
    }

    fn build(&self) -> Result<(), RuntimeError> {
        self.fire(notify::BEFORE_RENDER, Value::Null);
        let widget = Rc::clone(&self.inner.widget);
        widget.init_structure(self)?;
        self.run_hooks(RenderPhase::Structure)?;
        widget.init_events(self)?;
        self.run_hooks(RenderPhase::Events)?;

        let runtime = self.runtime()?;
        let Some(main) = self.main() else {
            return Ok(());
        };
        let config = runtime.config();
        let mut classes = vec![config.type_class(self.widget_type())];
        if let Some(skin) = self.skin() {
            classes.push(config.skin_class(&skin));
        }
        for state in self.states() {
            classes.push(config.state_class(self.widget_type(), &state));
        }
        let id = self.id();
        let context_id = self.view_context().map(|c| c.id().to_owned());
        runtime.with_surface_mut(|surface| {
            surface.set_attribute(main, &config.instance_attr, id)?;
            if let Some(context_id) = context_id {
                surface.set_attribute(main, &config.context_attr, context_id)?;
            }
            for class in &classes {
                surface.add_class(main, class)?;
            }
            Ok(())
        })
    }

    fn run_hooks(&self, phase: RenderPhase) -> Result<(), RuntimeError> {
        let hooks: Vec<RenderHook> = self
            .inner
            .hooks
            .borrow()
            .iter()
            .filter(|(p, _)| *p == phase)
            .map(|(_, hook)| Rc::clone(hook))
            .collect();
        for hook in hooks {
            self.call_hook(phase, &hook)?;
        }
        Ok(())
    }

    fn call_hook(&self, phase: RenderPhase, hook: &RenderHook) -> Result<(), RuntimeError> {
        hook(self).map_err(|source| RuntimeError::Hook {
            context: format!("{phase:?} hook on component \"{}\"", self.id()),
            source,
        })
    }

    /// Register a hook for the initial render. Runs immediately if the
    /// component is already rendered; ignored once disposed.
    pub fn add_render_hook(
        &self,
        phase: RenderPhase,
        hook: impl Fn(&Component) -> Result<(), BoxError> + 'static,
    ) -> Result<(), RuntimeError> {
        let hook: RenderHook = Rc::new(hook);
        match self.stage() {
            Stage::Disposed => Ok(()),
            Stage::Rendered => self.call_hook(phase, &hook),
            Stage::New | Stage::Inited => {
                self.inner.hooks.borrow_mut().push((phase, hook));
                Ok(())
            }
        }
    }

    /// Run the widget's repaint. `None` paints everything.
    pub fn repaint(&self, changes: Option<&ChangeSet>) -> Result<ChangeSet, RuntimeError> {
        let widget = Rc::clone(&self.inner.widget);
        Ok(widget.repaint(self, changes)?)
    }

    /// Dispose the component: children (depth-first), DOM events,
    /// extensions, parent and view context links. Idempotent.
    pub fn dispose(&self) {
        if self.is_disposed() || self.inner.disposing.replace(true) {
            return;
        }
        self.fire(notify::BEFORE_DISPOSE, Value::Null);

        for child in self.children() {
            child.dispose();
        }
        self.clear_dom_events(None);

        let extensions = std::mem::take(&mut *self.inner.extensions.borrow_mut());
        for extension in extensions {
            extension.dispose();
        }

        if let Some(parent) = self.parent() {
            parent.remove_child(self);
        }
        if let Some(context) = self.view_context() {
            context.remove(self);
        }
        *self.inner.context.borrow_mut() = Weak::new();

        if let Ok(runtime) = self.runtime() {
            if let Some(main) = self.main() {
                let config = runtime.config();
                runtime.with_surface_mut(|surface| {
                    surface.remove_attribute(main, &config.instance_attr);
                    surface.remove_attribute(main, &config.context_attr);
                });
            }
            runtime.inner.components.borrow_mut().remove(self.inner.key);
        }

        self.inner.lifecycle.advance(Stage::Disposed);
        self.inner.hooks.borrow_mut().clear();
        tracing::debug!(id = %self.id(), widget_type = self.widget_type(), "component disposed");
        self.fire(notify::AFTER_DISPOSE, Value::Null);
        self.inner.notifier.borrow_mut().clear();
    }

    /// Dispose, then remove the main node (and its subtree) from the surface.
    pub fn destroy(&self) {
        self.dispose();
        if let (Ok(runtime), Some(main)) = (self.runtime(), self.inner.main.take()) {
            runtime.with_surface_mut(|surface| surface.remove(main));
        }
    }

    // ── Properties ───────────────────────────────────────────────────

    /// Current value of `name`, through the accessor override when present.
    pub fn get(&self, name: &str) -> Value {
        let getter = self
            .inner
            .accessors
            .borrow()
            .get(name)
            .and_then(|accessor| accessor.get.clone());
        match getter {
            Some(getter) => getter(self),
            None => self.inner.properties.borrow().get(name),
        }
    }

    /// Names of the values stored in the bag.
    pub fn property_names(&self) -> Vec<String> {
        let mut names = self.inner.properties.borrow().keys();
        names.sort();
        names
    }

    fn store(&self, name: &str, value: Value) {
        let setter = self
            .inner
            .accessors
            .borrow()
            .get(name)
            .and_then(|accessor| accessor.set.clone());
        match setter {
            Some(setter) => setter(self, value),
            None => self
                .inner
                .properties
                .borrow_mut()
                .insert(name.to_owned(), value),
        }
    }

    /// Install a per-instance accessor override for `name`.
    pub fn set_accessor(&self, name: impl Into<String>, accessor: Accessor) {
        self.inner.accessors.borrow_mut().insert(name.into(), accessor);
    }

    pub fn remove_accessor(&self, name: &str) -> Option<Accessor> {
        self.inner.accessors.borrow_mut().remove(name)
    }

    /// Apply a single property.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<ChangeSet, RuntimeError> {
        self.set_properties(Properties::new().with(name, value))
    }

    /// Diff `properties` against the current values, store the changed ones
    /// and, when rendered, repaint them. Returns the changes.
    pub fn set_properties(&self, mut properties: Properties) -> Result<ChangeSet, RuntimeError> {
        if self.is_disposed() {
            return Ok(ChangeSet::new());
        }

        for key in RESERVED_KEYS {
            if let Some(value) = properties.remove(key) {
                if self.stage() == Stage::New {
                    self.apply_reserved(key, value);
                }
            }
        }
        if let Some(link) = properties.take_view_context() {
            self.set_view_context(link.as_ref());
        }

        let widget = Rc::clone(&self.inner.widget);
        let mut changes = ChangeSet::new();
        for (name, new) in properties.into_entries() {
            let old = self.get(&name);
            if !widget.is_property_changed(&name, &old, &new) {
                continue;
            }
            self.store(&name, new.clone());
            changes.push(ChangeRecord::new(name, old, new));
        }

        if !changes.is_empty() && self.stage() == Stage::Rendered {
            self.repaint(Some(&changes))?;
        }
        Ok(changes)
    }

    fn apply_reserved(&self, key: &str, value: Value) {
        match key {
            "id" => {
                let id = value.to_string();
                if id.is_empty() || id == *self.inner.id.borrow() {
                    return;
                }
                let context = self.view_context();
                if let Some(context) = &context {
                    context.remove(self);
                }
                *self.inner.id.borrow_mut() = id;
                if let Some(context) = &context {
                    context.add(self);
                }
            }
            "group" => {
                *self.inner.groups.borrow_mut() = value
                    .to_string()
                    .split_whitespace()
                    .map(str::to_owned)
                    .collect();
            }
            "skin" => {
                let skin = value.to_string();
                *self.inner.skin.borrow_mut() = (!skin.is_empty()).then_some(skin);
            }
            _ => {}
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.get("disabled").is_truthy()
    }

    pub fn set_disabled(&self, disabled: bool) -> Result<ChangeSet, RuntimeError> {
        self.set("disabled", disabled)
    }

    pub fn disable(&self) -> Result<ChangeSet, RuntimeError> {
        self.set_disabled(true)
    }

    pub fn enable(&self) -> Result<ChangeSet, RuntimeError> {
        self.set_disabled(false)
    }

    pub fn is_hidden(&self) -> bool {
        self.get("hidden").is_truthy()
    }

    pub fn show(&self) -> Result<ChangeSet, RuntimeError> {
        self.set("hidden", false)
    }

    pub fn hide(&self) -> Result<ChangeSet, RuntimeError> {
        self.set("hidden", true)
    }

    pub fn is_read_only(&self) -> bool {
        self.get("readOnly").is_truthy()
    }

    pub fn set_read_only(&self, read_only: bool) -> Result<ChangeSet, RuntimeError> {
        self.set("readOnly", read_only)
    }

    // ── States ───────────────────────────────────────────────────────

    pub fn has_state(&self, state: &str) -> bool {
        self.inner.states.borrow().contains(state)
    }

    pub fn states(&self) -> Vec<String> {
        self.inner.states.borrow().iter().cloned().collect()
    }

    /// Add a state; once rendered, the state class is written on the main
    /// node.
    pub fn add_state(&self, state: &str) -> Result<(), RuntimeError> {
        if state.is_empty() {
            return Err(RuntimeError::EmptyStateName);
        }
        if self.inner.states.borrow_mut().insert(state.to_owned()) {
            self.write_state_class(state, true)?;
        }
        Ok(())
    }

    pub fn remove_state(&self, state: &str) -> Result<(), RuntimeError> {
        if state.is_empty() {
            return Err(RuntimeError::EmptyStateName);
        }
        if self.inner.states.borrow_mut().remove(state) {
            self.write_state_class(state, false)?;
        }
        Ok(())
    }

    pub fn toggle_state(&self, state: &str) -> Result<(), RuntimeError> {
        if self.has_state(state) {
            self.remove_state(state)
        } else {
            self.add_state(state)
        }
    }

    fn write_state_class(&self, state: &str, present: bool) -> Result<(), RuntimeError> {
        if self.stage() != Stage::Rendered && !self.inner.rendering.get() {
            return Ok(());
        }
        let (Some(main), Ok(runtime)) = (self.main(), self.runtime()) else {
            return Ok(());
        };
        let class = runtime.config().state_class(self.widget_type(), state);
        runtime.with_surface_mut(|surface| {
            if !surface.contains(main) {
                return Ok(());
            }
            if present {
                surface.add_class(main, &class)
            } else {
                surface.remove_class(main, &class)
            }
        })
    }

    /// Whether delegated input is currently ignored (see
    /// `Widget::ignore_states`).
    pub fn is_ignoring_input(&self) -> bool {
        self.inner
            .widget
            .ignore_states()
            .iter()
            .any(|state| self.has_state(state))
    }

    // ── Children ─────────────────────────────────────────────────────

    pub fn children(&self) -> Vec<Component> {
        self.inner.children.borrow().clone()
    }

    pub fn parent(&self) -> Option<Component> {
        self.inner
            .parent
            .borrow()
            .upgrade()
            .map(|inner| Component { inner })
    }

    pub fn child_name(&self) -> Option<String> {
        self.inner.child_name.borrow().clone()
    }

    /// Child registered under `name`.
    pub fn child(&self, name: &str) -> Option<Component> {
        self.inner
            .children
            .borrow()
            .iter()
            .find(|child| child.inner.child_name.borrow().as_deref() == Some(name))
            .cloned()
    }

    /// Take ownership of `child`, detaching it from its previous parent. The
    /// child joins this component's view context.
    pub fn add_child(&self, child: &Component, name: Option<&str>) -> Result<(), RuntimeError> {
        let mut cursor = Some(self.clone());
        while let Some(current) = cursor {
            if current.ptr_eq(child) {
                return Err(RuntimeError::CyclicChild {
                    parent: self.id(),
                    child: child.id(),
                });
            }
            cursor = current.parent();
        }

        match child.parent() {
            Some(parent) if parent.ptr_eq(self) => {}
            Some(parent) => {
                parent.remove_child(child);
                self.attach_child(child);
            }
            None => self.attach_child(child),
        }
        *child.inner.child_name.borrow_mut() = name.map(str::to_owned);

        if let Some(context) = self.view_context() {
            let same = child
                .view_context()
                .is_some_and(|current| current.ptr_eq(&context));
            if !same {
                child.set_view_context(Some(&context));
            }
        }
        Ok(())
    }

    fn attach_child(&self, child: &Component) {
        self.inner.children.borrow_mut().push(child.clone());
        *child.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);
    }

    /// Give up ownership of `child` without disposing it.
    pub fn remove_child(&self, child: &Component) -> bool {
        let removed = {
            let mut children = self.inner.children.borrow_mut();
            let before = children.len();
            children.retain(|c| !c.ptr_eq(child));
            children.len() != before
        };
        if removed {
            *child.inner.parent.borrow_mut() = Weak::new();
            *child.inner.child_name.borrow_mut() = None;
        }
        removed
    }

    /// Dispose every child.
    pub fn dispose_children(&self) {
        for child in self.children() {
            child.dispose();
        }
    }

    // ── View context ─────────────────────────────────────────────────

    pub fn view_context(&self) -> Option<ViewContext> {
        self.inner
            .context
            .borrow()
            .upgrade()
            .map(ViewContext::from_inner)
    }

    /// Move this component (and its children) to `context`.
    ///
    /// Leaves the old context, joins the new one. Not a property change: no
    /// change record is produced and no painter runs.
    pub fn set_view_context(&self, context: Option<&ViewContext>) {
        let context = context.filter(|context| !context.is_disposed());
        let current = self.view_context();
        let same = match (&current, context) {
            (None, None) => true,
            (Some(a), Some(b)) => a.ptr_eq(b),
            _ => false,
        };
        if same {
            return;
        }
        if let Some(old) = current {
            *self.inner.context.borrow_mut() = Weak::new();
            old.remove(self);
        }
        if let Some(context) = context {
            *self.inner.context.borrow_mut() = context.downgrade();
            context.add(self);
        }
        for child in self.children() {
            child.set_view_context(context);
        }
    }

    pub(crate) fn unlink_context(&self, context: &ViewContext) {
        let linked = self
            .view_context()
            .is_some_and(|current| current.ptr_eq(context));
        if linked {
            *self.inner.context.borrow_mut() = Weak::new();
        }
    }

    // ── Extensions ───────────────────────────────────────────────────

    pub fn extensions(&self) -> Vec<ExtensionHandle> {
        self.inner.extensions.borrow().clone()
    }

    /// Attach `extension` unless one of the same kind is already attached.
    /// Returns whether it was attached.
    pub fn use_extension(&self, extension: Rc<dyn Extension>) -> Result<bool, RuntimeError> {
        if self.is_disposed() {
            return Ok(false);
        }
        let duplicate = self
            .inner
            .extensions
            .borrow()
            .iter()
            .any(|handle| handle.kind() == extension.kind());
        if duplicate {
            tracing::trace!(id = %self.id(), kind = extension.kind(), "skipping duplicate extension");
            return Ok(false);
        }
        let handle = ExtensionHandle::new(extension);
        self.inner.extensions.borrow_mut().push(handle.clone());
        if let Err(err) = handle.attach_to(self) {
            self.inner
                .extensions
                .borrow_mut()
                .retain(|other| !other.ptr_eq(&handle));
            handle.dispose();
            return Err(err);
        }
        Ok(true)
    }

    /// Detach and return the extension of `kind`.
    pub fn remove_extension(&self, kind: &str) -> Option<ExtensionHandle> {
        let handle = {
            let mut extensions = self.inner.extensions.borrow_mut();
            let index = extensions.iter().position(|handle| handle.kind() == kind)?;
            extensions.remove(index)
        };
        handle.dispose();
        Some(handle)
    }

    // ── Notifications ────────────────────────────────────────────────

    pub fn on(
        &self,
        kind: &str,
        handler: impl Fn(&Component, &Notification) + 'static,
    ) -> SubscriptionId {
        self.inner
            .notifier
            .borrow_mut()
            .add(kind, false, Rc::new(handler))
    }

    /// Like [`Component::on`], but the handler runs at most once.
    pub fn once(
        &self,
        kind: &str,
        handler: impl Fn(&Component, &Notification) + 'static,
    ) -> SubscriptionId {
        self.inner
            .notifier
            .borrow_mut()
            .add(kind, true, Rc::new(handler))
    }

    pub fn off(&self, subscription: SubscriptionId) -> bool {
        self.inner.notifier.borrow_mut().remove(subscription)
    }

    /// Remove every handler for `kind`.
    pub fn off_all(&self, kind: &str) -> usize {
        self.inner.notifier.borrow_mut().remove_kind(kind)
    }

    pub fn listener_count(&self, kind: &str) -> usize {
        self.inner.notifier.borrow().count(kind)
    }

    pub fn fire(&self, kind: &str, payload: impl Into<Value>) {
        self.notify(Notification::new(kind, payload));
    }

    /// Deliver `notification` to the handlers subscribed to its kind, in
    /// subscription order.
    pub fn notify(&self, notification: Notification) {
        let handlers = self.inner.notifier.borrow().snapshot(&notification.kind);
        for (id, once, handler) in handlers {
            if !self.inner.notifier.borrow().contains(id) {
                continue;
            }
            if once {
                self.inner.notifier.borrow_mut().remove(id);
            }
            handler(self, &notification);
        }
    }

    /// The widget's pipeline, for callers composing derived pipelines.
    pub fn pipeline(&self) -> Pipeline {
        self.inner.widget.pipeline()
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.id())
            .field("widget_type", &self.widget_type())
            .field("stage", &self.stage())
            .finish()
    }
}
