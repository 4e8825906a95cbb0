//! The runtime: owner of the surface, the event pool, timers, widget types
//! and view contexts.
//!
//! A [`Runtime`] is a cheap, cloneable handle. Components, contexts and pool
//! listeners only hold weak links back to it, so dropping the last handle
//! tears everything down.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use slotmap::{new_key_type, SlotMap};

use crate::component::instance::ComponentInner;
use crate::component::{Component, Options, Properties, Widget};
use crate::config::RuntimeConfig;
use crate::context::{ContextInner, ViewContext};
use crate::error::RuntimeError;
use crate::event::input::{self, Route};
use crate::event::pool::EventPoolRegistry;
use crate::event::timer::TimerQueue;
use crate::event::DomEvent;
use crate::extension::ExtensionFactory;
use crate::surface::{NodeId, Surface};

new_key_type! {
    /// Runtime-wide handle of a live component.
    pub struct ComponentKey;
}

/// Produces a widget for `Runtime::create`.
pub type WidgetFactory = Rc<dyn Fn() -> Rc<dyn Widget>>;

pub(crate) struct RuntimeInner {
    pub(crate) config: RuntimeConfig,
    pub(crate) surface: RefCell<Surface>,
    pub(crate) pool: RefCell<EventPoolRegistry>,
    pub(crate) timers: RefCell<TimerQueue>,
    pub(crate) components: RefCell<SlotMap<ComponentKey, Weak<ComponentInner>>>,
    contexts: RefCell<HashMap<String, Weak<ContextInner>>>,
    default_context: RefCell<Option<ViewContext>>,
    widgets: RefCell<HashMap<String, WidgetFactory>>,
    global_extensions: RefCell<Vec<ExtensionFactory>>,
    next_guid: Cell<u64>,
}

/// Handle to a component runtime.
#[derive(Clone)]
pub struct Runtime {
    pub(crate) inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                config,
                surface: RefCell::new(Surface::new()),
                pool: RefCell::new(EventPoolRegistry::default()),
                timers: RefCell::new(TimerQueue::default()),
                components: RefCell::new(SlotMap::with_key()),
                contexts: RefCell::new(HashMap::new()),
                default_context: RefCell::new(None),
                widgets: RefCell::new(HashMap::new()),
                global_extensions: RefCell::new(Vec::new()),
                next_guid: Cell::new(0),
            }),
        }
    }

    pub(crate) fn upgrade(weak: &Weak<RuntimeInner>) -> Option<Runtime> {
        weak.upgrade().map(|inner| Runtime { inner })
    }

    pub(crate) fn downgrade(&self) -> Weak<RuntimeInner> {
        Rc::downgrade(&self.inner)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// Read the surface. Must not be called re-entrantly from `f`.
    pub fn with_surface<R>(&self, f: impl FnOnce(&Surface) -> R) -> R {
        f(&self.inner.surface.borrow())
    }

    /// Mutate the surface. Must not be called re-entrantly from `f`.
    pub fn with_surface_mut<R>(&self, f: impl FnOnce(&mut Surface) -> R) -> R {
        f(&mut self.inner.surface.borrow_mut())
    }

    /// Next value of the runtime-wide id counter (starts at 1).
    pub fn next_guid(&self) -> u64 {
        let next = self.inner.next_guid.get() + 1;
        self.inner.next_guid.set(next);
        next
    }

    // ── View contexts ────────────────────────────────────────────────

    /// The context components join when none is given; recreated if the
    /// previous default was disposed.
    pub fn default_context(&self) -> ViewContext {
        if let Some(context) = self.inner.default_context.borrow().as_ref() {
            if !context.is_disposed() {
                return context.clone();
            }
        }
        let context = self.create_view_context(&self.inner.config.default_context_id);
        *self.inner.default_context.borrow_mut() = Some(context.clone());
        context
    }

    /// Create a context. An id already taken by a live context gets a `-<n>`
    /// suffix; an empty id is generated. Registry entries of dropped contexts
    /// are pruned first.
    pub fn create_view_context(&self, id: &str) -> ViewContext {
        let base = if id.is_empty() {
            format!("ctx-{}", self.next_guid())
        } else {
            id.to_owned()
        };
        let id = {
            let mut contexts = self.inner.contexts.borrow_mut();
            // contexts dropped without `dispose` leave dead entries behind
            contexts.retain(|_, weak| weak.strong_count() > 0);
            let taken = |candidate: &str| {
                contexts
                    .get(candidate)
                    .is_some_and(|weak| weak.strong_count() > 0)
            };
            let mut candidate = base.clone();
            let mut n = 0;
            while taken(&candidate) {
                n += 1;
                candidate = format!("{base}-{n}");
            }
            candidate
        };
        let context = ViewContext::new(id.clone(), self);
        self.inner
            .contexts
            .borrow_mut()
            .insert(id.clone(), context.downgrade());
        tracing::debug!(context = %id, "view context created");
        context
    }

    /// Live context registered under `id`.
    pub fn view_context(&self, id: &str) -> Option<ViewContext> {
        self.inner
            .contexts
            .borrow()
            .get(id)
            .and_then(Weak::upgrade)
            .map(ViewContext::from_inner)
    }

    pub(crate) fn forget_context(&self, id: &str) {
        self.inner.contexts.borrow_mut().remove(id);
    }

    /// Ids of the live contexts, sorted.
    pub fn view_context_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .inner
            .contexts
            .borrow()
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    // ── Widget types and construction ────────────────────────────────

    /// Register a widget type for markup binding and [`Runtime::create`].
    pub fn register_widget(
        &self,
        widget_type: &str,
        factory: WidgetFactory,
    ) -> Result<(), RuntimeError> {
        let mut widgets = self.inner.widgets.borrow_mut();
        if widgets.contains_key(widget_type) {
            return Err(RuntimeError::DuplicateWidget(widget_type.to_owned()));
        }
        widgets.insert(widget_type.to_owned(), factory);
        Ok(())
    }

    pub fn is_registered(&self, widget_type: &str) -> bool {
        self.inner.widgets.borrow().contains_key(widget_type)
    }

    /// Construct a component of a registered type.
    pub fn create(&self, widget_type: &str, properties: Properties) -> Result<Component, RuntimeError> {
        self.create_with(widget_type, Options::new(properties))
    }

    pub fn create_with(&self, widget_type: &str, options: Options) -> Result<Component, RuntimeError> {
        let factory = self
            .inner
            .widgets
            .borrow()
            .get(widget_type)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownWidget(widget_type.to_owned()))?;
        Component::with_options(self, factory(), options)
    }

    /// Construct a component in `context`.
    pub fn create_in(
        &self,
        widget: Rc<dyn Widget>,
        context: &ViewContext,
        properties: Properties,
    ) -> Result<Component, RuntimeError> {
        Component::with_options(self, widget, Options::new(properties).with_view_context(context))
    }

    /// Add an extension factory applied to every component constructed from
    /// now on.
    pub fn register_global_extension(&self, factory: ExtensionFactory) {
        self.inner.global_extensions.borrow_mut().push(factory);
    }

    pub(crate) fn global_extensions(&self) -> Vec<ExtensionFactory> {
        self.inner.global_extensions.borrow().clone()
    }

    /// Number of constructed, not yet disposed, live components.
    pub fn component_count(&self) -> usize {
        self.inner
            .components
            .borrow()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Dispatch `event` at `target` and bubble it up the surface, stopping
    /// once a listener stops propagation. Returns the event for inspection.
    ///
    /// Listeners are snapshotted per node; one removed by an earlier
    /// listener does not run.
    pub fn dispatch(&self, target: NodeId, mut event: DomEvent) -> DomEvent {
        event.set_target(target);
        let path = self.with_surface(|surface| surface.bubble_path(target));
        for node in path {
            let listeners = self.with_surface(|surface| surface.listeners_for(node, event.kind()));
            for (id, callback) in listeners {
                if !self.with_surface(|surface| surface.has_listener(id)) {
                    continue;
                }
                event.set_current_target(Some(node));
                callback(&mut event);
            }
            if event.is_propagation_stopped() {
                break;
            }
        }
        event.set_current_target(None);
        event
    }

    /// Dispatch a terminal input event on the global node it belongs to.
    /// Returns `None` for input the runtime does not model.
    pub fn feed(&self, event: crossterm::event::Event) -> Option<DomEvent> {
        let (route, event) = input::translate(event)?;
        let target = self.with_surface(|surface| match route {
            Route::Document => surface.document(),
            Route::Viewport => surface.viewport(),
        });
        Some(self.dispatch(target, event))
    }

    /// Dispose every view context, release the pooled listeners and drop
    /// pending timers.
    pub fn dispose(&self) {
        let mut contexts: Vec<ViewContext> = self
            .inner
            .contexts
            .borrow()
            .values()
            .filter_map(Weak::upgrade)
            .map(ViewContext::from_inner)
            .collect();
        contexts.extend(self.inner.default_context.borrow_mut().take());
        for context in contexts {
            context.dispose();
        }
        let teardowns = self.inner.pool.borrow_mut().teardown();
        for teardown in teardowns {
            self.release(teardown);
        }
        self.inner.timers.borrow_mut().clear();
        tracing::debug!("runtime disposed");
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.inner.config)
            .field("components", &self.component_count())
            .field("contexts", &self.view_context_ids())
            .field("pools", &self.pool_len())
            .field("timers", &self.pending_timers())
            .finish()
    }
}
