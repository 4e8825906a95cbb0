//! Per-component DOM event wiring.
//!
//! Each component keeps one handler queue per `(node, kind)`. The first
//! handler for a queue attaches the raw listener: a private one for ordinary
//! nodes, a slot in the shared pool for the viewport and document. Removing
//! the last handler releases it again.

use std::collections::HashMap;
use std::rc::Rc;

use super::dom_event::DomEvent;
use crate::component::{Component, Notification, Stage};
use crate::error::RuntimeError;
use crate::surface::{ListenerId, NodeId, RawCallback};
use crate::value::Value;

/// Handle to one delegated handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

pub type DomHandler = Rc<dyn Fn(&Component, &mut DomEvent)>;

struct HandlerQueue {
    handlers: Vec<(HandlerId, DomHandler)>,
    /// `None` when the queue is served by the shared pool.
    private: Option<ListenerId>,
}

#[derive(Default)]
pub(crate) struct DomEventTable {
    queues: HashMap<(NodeId, String), HandlerQueue>,
    next: u64,
}

impl DomEventTable {
    fn next_id(&mut self) -> HandlerId {
        self.next += 1;
        HandlerId(self.next)
    }

    fn contains(&self, node: NodeId, kind: &str, id: HandlerId) -> bool {
        self.queues
            .get(&(node, kind.to_owned()))
            .is_some_and(|queue| queue.handlers.iter().any(|(h, _)| *h == id))
    }
}

impl Component {
    /// Add a DOM handler for `kind` on `node`.
    ///
    /// Requires the component to be rendered or rendering. Returns `Ok(None)`
    /// once disposed.
    pub fn add_dom_event(
        &self,
        node: NodeId,
        kind: &str,
        handler: impl Fn(&Component, &mut DomEvent) + 'static,
    ) -> Result<Option<HandlerId>, RuntimeError> {
        let stage = self.stage();
        if stage == Stage::Disposed {
            return Ok(None);
        }
        if stage != Stage::Rendered && !self.is_rendering() {
            return Err(RuntimeError::StageViolation {
                operation: "wire DOM events",
                id: self.id(),
                stage,
            });
        }

        let handler: DomHandler = Rc::new(handler);
        let queue_key = (node, kind.to_owned());
        {
            let mut table = self.inner.dom_events.borrow_mut();
            let id = table.next_id();
            if let Some(queue) = table.queues.get_mut(&queue_key) {
                queue.handlers.push((id, handler));
                return Ok(Some(id));
            }
        }

        let runtime = self.runtime()?;
        let private = if runtime.with_surface(|surface| surface.is_global(node)) {
            runtime.join_pool(node, kind, self.key())?;
            None
        } else {
            let weak = self.downgrade();
            let callback: RawCallback = Rc::new(move |event: &mut DomEvent| {
                if let Some(component) = weak.upgrade() {
                    component.trigger_dom_event(node, event);
                }
            });
            Some(runtime.with_surface_mut(|surface| surface.listen(node, kind, callback))?)
        };

        let mut table = self.inner.dom_events.borrow_mut();
        let id = table.next_id();
        table.queues.insert(
            queue_key,
            HandlerQueue {
                handlers: vec![(id, handler)],
                private,
            },
        );
        tracing::trace!(id = %self.id(), ?node, kind, pooled = private.is_none(), "wired DOM event");
        Ok(Some(id))
    }

    /// Remove one handler (`Some`) or the whole queue (`None`) for `kind` on
    /// `node`. Returns whether anything was removed.
    pub fn remove_dom_event(&self, node: NodeId, kind: &str, handler: Option<HandlerId>) -> bool {
        let queue_key = (node, kind.to_owned());
        let (removed, released) = {
            let mut table = self.inner.dom_events.borrow_mut();
            let Some(queue) = table.queues.get_mut(&queue_key) else {
                return false;
            };
            let before = queue.handlers.len();
            match handler {
                Some(id) => queue.handlers.retain(|(h, _)| *h != id),
                None => queue.handlers.clear(),
            }
            let removed = queue.handlers.len() != before;
            let released = if queue.handlers.is_empty() {
                table.queues.remove(&queue_key).map(|queue| queue.private)
            } else {
                None
            };
            (removed, released)
        };

        if let Some(private) = released {
            if let Ok(runtime) = self.runtime() {
                match private {
                    Some(listener) => {
                        runtime.with_surface_mut(|surface| surface.unlisten(listener));
                    }
                    None => runtime.leave_pool(node, kind, self.key()),
                }
            }
        }
        removed
    }

    /// Remove every handler on `node`, or on all nodes with `None`.
    pub fn clear_dom_events(&self, node: Option<NodeId>) {
        let keys: Vec<(NodeId, String)> = self
            .inner
            .dom_events
            .borrow()
            .queues
            .keys()
            .filter(|(n, _)| node.is_none_or(|wanted| *n == wanted))
            .cloned()
            .collect();
        for (node, kind) in keys {
            self.remove_dom_event(node, &kind, None);
        }
    }

    /// Number of handlers queued for `kind` on `node`.
    pub fn dom_handler_count(&self, node: NodeId, kind: &str) -> usize {
        self.inner
            .dom_events
            .borrow()
            .queues
            .get(&(node, kind.to_owned()))
            .map_or(0, |queue| queue.handlers.len())
    }

    /// Re-fire DOM `kind` on `node` as the component notification
    /// `notification`, carrying the event.
    pub fn delegate_dom_event(
        &self,
        node: NodeId,
        kind: &str,
        notification: &str,
    ) -> Result<Option<HandlerId>, RuntimeError> {
        let notification = notification.to_owned();
        self.add_dom_event(node, kind, move |component, event| {
            component.notify(
                Notification::new(notification.as_str(), Value::Null).with_event(event.clone()),
            );
        })
    }

    /// Run this component's handlers for `event` on `node`, unless the
    /// component is in one of its widget's ignore states.
    pub(crate) fn trigger_dom_event(&self, node: NodeId, event: &mut DomEvent) {
        if self.is_disposed() || self.is_ignoring_input() {
            return;
        }
        event.set_current_target(Some(node));
        let handlers: Vec<(HandlerId, DomHandler)> = self
            .inner
            .dom_events
            .borrow()
            .queues
            .get(&(node, event.kind().to_owned()))
            .map(|queue| queue.handlers.clone())
            .unwrap_or_default();
        for (id, handler) in handlers {
            let still_queued = self
                .inner
                .dom_events
                .borrow()
                .contains(node, event.kind(), id);
            if still_queued {
                handler(self, event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Properties, Widget};
    use crate::runtime::Runtime;
    use std::cell::RefCell;

    struct Panel;

    impl Widget for Panel {
        fn widget_type(&self) -> &str {
            "Panel"
        }
    }

    fn rendered(runtime: &Runtime) -> Component {
        let c = Component::new(runtime, Rc::new(Panel), Properties::new()).unwrap();
        c.render().unwrap();
        c
    }

    #[test]
    fn wiring_before_render_is_a_stage_violation() {
        let runtime = Runtime::new();
        let c = Component::new(&runtime, Rc::new(Panel), Properties::new()).unwrap();
        let main = c.main().unwrap();
        let err = c.add_dom_event(main, "click", |_, _| {}).unwrap_err();
        assert!(matches!(err, RuntimeError::StageViolation { stage: Stage::Inited, .. }));
    }

    #[test]
    fn private_listener_follows_queue() {
        let runtime = Runtime::new();
        let c = rendered(&runtime);
        let main = c.main().unwrap();
        let a = c.add_dom_event(main, "click", |_, _| {}).unwrap().unwrap();
        let b = c.add_dom_event(main, "click", |_, _| {}).unwrap().unwrap();
        assert_eq!(runtime.with_surface(|s| s.listener_count(main, "click")), 1);
        assert_eq!(c.dom_handler_count(main, "click"), 2);

        assert!(c.remove_dom_event(main, "click", Some(a)));
        assert_eq!(runtime.with_surface(|s| s.listener_count(main, "click")), 1);
        assert!(c.remove_dom_event(main, "click", Some(b)));
        assert_eq!(runtime.with_surface(|s| s.listener_count(main, "click")), 0);
        assert!(!c.remove_dom_event(main, "click", None));
    }

    #[test]
    fn handlers_see_current_target() {
        let runtime = Runtime::new();
        let c = rendered(&runtime);
        let main = c.main().unwrap();
        let seen = Rc::new(RefCell::new(None));
        let s = Rc::clone(&seen);
        c.add_dom_event(main, "click", move |_, e| *s.borrow_mut() = e.current_target())
            .unwrap();
        runtime.dispatch(main, DomEvent::new("click"));
        assert_eq!(*seen.borrow(), Some(main));
    }

    #[test]
    fn handler_removed_mid_dispatch_does_not_run() {
        let runtime = Runtime::new();
        let c = rendered(&runtime);
        let main = c.main().unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        let second = Rc::new(RefCell::new(None));

        let (l, s) = (Rc::clone(&log), Rc::clone(&second));
        c.add_dom_event(main, "click", move |c, e| {
            l.borrow_mut().push("first");
            if let Some(id) = *s.borrow() {
                c.remove_dom_event(e.current_target().unwrap(), "click", Some(id));
            }
        })
        .unwrap();
        let l = Rc::clone(&log);
        let id = c
            .add_dom_event(main, "click", move |_, _| l.borrow_mut().push("second"))
            .unwrap();
        *second.borrow_mut() = id;

        runtime.dispatch(main, DomEvent::new("click"));
        assert_eq!(*log.borrow(), vec!["first"]);
    }

    #[test]
    fn delegated_notification_carries_event() {
        let runtime = Runtime::new();
        let c = rendered(&runtime);
        let main = c.main().unwrap();
        c.delegate_dom_event(main, "click", "press").unwrap();
        let kinds = Rc::new(RefCell::new(Vec::new()));
        let k = Rc::clone(&kinds);
        c.on("press", move |_, n| {
            k.borrow_mut()
                .push(n.event.as_ref().map(|e| e.kind().to_owned()));
        });
        runtime.dispatch(main, DomEvent::new("click"));
        assert_eq!(*kinds.borrow(), vec![Some("click".to_owned())]);
    }

    #[test]
    fn dispose_releases_listeners() {
        let runtime = Runtime::new();
        let c = rendered(&runtime);
        let main = c.main().unwrap();
        let viewport = runtime.with_surface(|s| s.viewport());
        c.add_dom_event(main, "click", |_, _| {}).unwrap();
        c.add_dom_event(viewport, "focus", |_, _| {}).unwrap();
        assert_eq!(runtime.pooled_count(viewport, "focus"), 1);
        c.dispose();
        assert_eq!(runtime.with_surface(|s| s.total_listeners()), 0);
        assert!(!runtime.has_pool(viewport, "focus"));
        assert_eq!(c.add_dom_event(main, "click", |_, _| {}).unwrap(), None);
    }
}
