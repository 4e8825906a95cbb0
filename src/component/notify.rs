//! Component-level notifications: `on` / `once` / `off` / `fire`.
//!
//! The runtime fires lifecycle notifications under the names in this module;
//! widgets fire their own semantic ones (e.g. a value-change notification).
//! Handlers are snapshotted before a fire, so a handler may subscribe or
//! unsubscribe freely.

use std::fmt;
use std::rc::Rc;

use super::instance::Component;
use crate::event::DomEvent;
use crate::value::Value;

pub const INIT: &str = "init";
pub const BEFORE_RENDER: &str = "beforerender";
pub const AFTER_RENDER: &str = "afterrender";
pub const BEFORE_DISPOSE: &str = "beforedispose";
pub const AFTER_DISPOSE: &str = "afterdispose";

/// A fired notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: String,
    pub payload: Value,
    /// The DOM event this notification was delegated from, if any.
    pub event: Option<DomEvent>,
}

impl Notification {
    pub fn new(kind: impl Into<String>, payload: impl Into<Value>) -> Self {
        Self {
            kind: kind.into(),
            payload: payload.into(),
            event: None,
        }
    }

    /// Attach the originating DOM event (builder).
    pub fn with_event(mut self, event: DomEvent) -> Self {
        self.event = Some(event);
        self
    }
}

/// Notification handler.
pub type NotifyHandler = Rc<dyn Fn(&Component, &Notification)>;

/// Handle returned by `on` / `once`, accepted by `off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Entry {
    id: SubscriptionId,
    kind: String,
    once: bool,
    handler: NotifyHandler,
}

#[derive(Default)]
pub(crate) struct Notifier {
    next: u64,
    entries: Vec<Entry>,
}

impl Notifier {
    pub(crate) fn add(&mut self, kind: &str, once: bool, handler: NotifyHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next);
        self.next += 1;
        self.entries.push(Entry {
            id,
            kind: kind.to_owned(),
            once,
            handler,
        });
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub(crate) fn remove_kind(&mut self, kind: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.kind != kind);
        before - self.entries.len()
    }

    pub(crate) fn contains(&self, id: SubscriptionId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub(crate) fn snapshot(&self, kind: &str) -> Vec<(SubscriptionId, bool, NotifyHandler)> {
        self.entries
            .iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| (entry.id, entry.once, Rc::clone(&entry.handler)))
            .collect()
    }

    pub(crate) fn count(&self, kind: &str) -> usize {
        self.entries.iter().filter(|entry| entry.kind == kind).count()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("handlers", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_remove_and_count() {
        let mut notifier = Notifier::default();
        let a = notifier.add("change", false, Rc::new(|_, _| {}));
        let _b = notifier.add("change", true, Rc::new(|_, _| {}));
        notifier.add("other", false, Rc::new(|_, _| {}));
        assert_eq!(notifier.count("change"), 2);
        assert!(notifier.remove(a));
        assert!(!notifier.remove(a));
        assert!(!notifier.contains(a));
        assert_eq!(notifier.remove_kind("change"), 1);
        assert_eq!(notifier.count("other"), 1);
        notifier.clear();
        assert_eq!(notifier.count("other"), 0);
    }

    #[test]
    fn snapshot_keeps_subscription_order() {
        let mut notifier = Notifier::default();
        let a = notifier.add("x", false, Rc::new(|_, _| {}));
        let b = notifier.add("x", true, Rc::new(|_, _| {}));
        let ids: Vec<(SubscriptionId, bool)> = notifier
            .snapshot("x")
            .into_iter()
            .map(|(id, once, _)| (id, once))
            .collect();
        assert_eq!(ids, vec![(a, false), (b, true)]);
    }

    #[test]
    fn notification_builder() {
        let n = Notification::new("change", 3).with_event(DomEvent::new("input"));
        assert_eq!(n.payload, Value::from(3));
        assert_eq!(n.event.as_ref().map(DomEvent::kind), Some("input"));
    }
}
