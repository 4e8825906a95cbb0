//! Shared listeners on global nodes.
//!
//! Any number of components may subscribe to the same event kind on the
//! viewport or document. The pool keeps exactly one raw listener per
//! `(node, kind)` and fans each event out to the subscribers' handler queues.
//!
//! Unsubscribing vacates the subscriber's slot instead of splicing it out, so
//! a fan-out in progress keeps its indices. Vacated slots are compacted when
//! no fan-out for the entry is running. Once every slot is vacated the raw
//! listener is released and any pending debounced delivery is cancelled.
//!
//! Kinds listed in `RuntimeConfig::debounced_kinds` are delivered once the
//! events stop arriving for `RuntimeConfig::debounce`.

use std::collections::HashMap;
use std::rc::Rc;

use super::dom_event::DomEvent;
use super::timer::TimerId;
use crate::component::Component;
use crate::error::RuntimeError;
use crate::runtime::{ComponentKey, Runtime};
use crate::surface::{ListenerId, NodeId, RawCallback};

type PoolKey = (NodeId, String);

struct PoolEntry {
    slots: Vec<Option<ComponentKey>>,
    listener: ListenerId,
    pending: Option<TimerId>,
    dispatching: usize,
    generation: u64,
}

impl PoolEntry {
    fn live(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    fn compact(&mut self) {
        self.slots.retain(Option::is_some);
    }
}

/// What a fan-out finds at a slot index.
pub(crate) enum Slot {
    /// The entry is gone, was recreated, or the index is past the end.
    Stop,
    Vacant,
    Subscriber(ComponentKey),
}

/// Resources to release once an entry loses its last subscriber.
pub(crate) struct Teardown {
    pub(crate) listener: ListenerId,
    pub(crate) pending: Option<TimerId>,
}

#[derive(Default)]
pub(crate) struct EventPoolRegistry {
    entries: HashMap<PoolKey, PoolEntry>,
    generation: u64,
}

impl EventPoolRegistry {
    pub(crate) fn contains(&self, node: NodeId, kind: &str) -> bool {
        self.entries.contains_key(&(node, kind.to_owned()))
    }

    /// Subscribers still holding a slot.
    pub(crate) fn live_count(&self, node: NodeId, kind: &str) -> usize {
        self.entries
            .get(&(node, kind.to_owned()))
            .map_or(0, PoolEntry::live)
    }

    /// Slots including vacated ones awaiting compaction.
    #[cfg(test)]
    pub(crate) fn slot_count(&self, node: NodeId, kind: &str) -> usize {
        self.entries
            .get(&(node, kind.to_owned()))
            .map_or(0, |entry| entry.slots.len())
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn create(
        &mut self,
        node: NodeId,
        kind: &str,
        listener: ListenerId,
        key: ComponentKey,
    ) {
        self.generation += 1;
        self.entries.insert(
            (node, kind.to_owned()),
            PoolEntry {
                slots: vec![Some(key)],
                listener,
                pending: None,
                dispatching: 0,
                generation: self.generation,
            },
        );
    }

    /// Add `key` to an existing entry. Returns `false` when there is no entry.
    pub(crate) fn join(&mut self, node: NodeId, kind: &str, key: ComponentKey) -> bool {
        let Some(entry) = self.entries.get_mut(&(node, kind.to_owned())) else {
            return false;
        };
        if !entry.slots.contains(&Some(key)) {
            entry.slots.push(Some(key));
        }
        true
    }

    /// Vacate `key`'s slot. When no live slot remains the entry is deleted
    /// and its resources are returned for release.
    pub(crate) fn leave(&mut self, node: NodeId, kind: &str, key: ComponentKey) -> Option<Teardown> {
        let pool_key = (node, kind.to_owned());
        let entry = self.entries.get_mut(&pool_key)?;
        let slot = entry.slots.iter_mut().find(|slot| **slot == Some(key))?;
        *slot = None;
        if entry.live() > 0 {
            if entry.dispatching == 0 {
                entry.compact();
            }
            return None;
        }
        self.entries.remove(&pool_key).map(|entry| Teardown {
            listener: entry.listener,
            pending: entry.pending,
        })
    }

    pub(crate) fn slot(&self, node: NodeId, kind: &str, index: usize, generation: u64) -> Slot {
        match self.entries.get(&(node, kind.to_owned())) {
            Some(entry) if entry.generation == generation => match entry.slots.get(index) {
                Some(Some(key)) => Slot::Subscriber(*key),
                Some(None) => Slot::Vacant,
                None => Slot::Stop,
            },
            _ => Slot::Stop,
        }
    }

    /// Mark a fan-out as running. Returns the entry's generation and the
    /// slot count the fan-out is bounded by.
    pub(crate) fn begin_dispatch(&mut self, node: NodeId, kind: &str) -> Option<(u64, usize)> {
        let entry = self.entries.get_mut(&(node, kind.to_owned()))?;
        entry.dispatching += 1;
        Some((entry.generation, entry.slots.len()))
    }

    pub(crate) fn end_dispatch(&mut self, node: NodeId, kind: &str, generation: u64) {
        if let Some(entry) = self.entries.get_mut(&(node, kind.to_owned())) {
            if entry.generation != generation {
                return;
            }
            entry.dispatching = entry.dispatching.saturating_sub(1);
            if entry.dispatching == 0 {
                entry.compact();
            }
        }
    }

    /// Record the pending debounced delivery, returning the one it replaces.
    pub(crate) fn set_pending(
        &mut self,
        node: NodeId,
        kind: &str,
        timer: Option<TimerId>,
    ) -> Option<TimerId> {
        let entry = self.entries.get_mut(&(node, kind.to_owned()))?;
        std::mem::replace(&mut entry.pending, timer)
    }

    /// Remove every entry.
    pub(crate) fn teardown(&mut self) -> Vec<Teardown> {
        self.entries
            .drain()
            .map(|(_, entry)| Teardown {
                listener: entry.listener,
                pending: entry.pending,
            })
            .collect()
    }
}

impl Runtime {
    /// Subscribe `key` to the shared listener for `kind` on a global node,
    /// attaching the raw listener on first use.
    pub(crate) fn join_pool(
        &self,
        node: NodeId,
        kind: &str,
        key: ComponentKey,
    ) -> Result<(), RuntimeError> {
        if self.inner.pool.borrow_mut().join(node, kind, key) {
            return Ok(());
        }
        let weak = self.downgrade();
        let owned_kind = kind.to_owned();
        let callback: RawCallback = Rc::new(move |event: &mut DomEvent| {
            if let Some(runtime) = Runtime::upgrade(&weak) {
                runtime.pooled_callback(node, &owned_kind, event);
            }
        });
        let listener = self.with_surface_mut(|surface| surface.listen(node, kind, callback))?;
        self.inner.pool.borrow_mut().create(node, kind, listener, key);
        tracing::debug!(?node, kind, "attached pooled listener");
        Ok(())
    }

    /// Vacate `key`'s slot, releasing the raw listener (and any pending
    /// debounced delivery) when it was the last subscriber.
    pub(crate) fn leave_pool(&self, node: NodeId, kind: &str, key: ComponentKey) {
        let teardown = self.inner.pool.borrow_mut().leave(node, kind, key);
        if let Some(teardown) = teardown {
            self.release(teardown);
            tracing::debug!(?node, kind, "released pooled listener");
        }
    }

    pub(crate) fn release(&self, teardown: Teardown) {
        if let Some(timer) = teardown.pending {
            self.cancel_timer(timer);
        }
        self.with_surface_mut(|surface| surface.unlisten(teardown.listener));
    }

    /// Live subscribers of the shared listener for `kind` on `node`.
    pub fn pooled_count(&self, node: NodeId, kind: &str) -> usize {
        self.inner.pool.borrow().live_count(node, kind)
    }

    /// Whether a shared listener exists for `kind` on `node`.
    pub fn has_pool(&self, node: NodeId, kind: &str) -> bool {
        self.inner.pool.borrow().contains(node, kind)
    }

    pub fn pool_len(&self) -> usize {
        self.inner.pool.borrow().len()
    }

    fn pooled_callback(&self, node: NodeId, kind: &str, event: &mut DomEvent) {
        if self.config().is_debounced(kind) {
            self.schedule_debounced(node, kind, event.snapshot());
        } else {
            self.fan_out(node, kind, event);
        }
    }

    /// Replace the pending delivery for `(node, kind)` with one carrying
    /// `event`, due after the configured quiet period.
    fn schedule_debounced(&self, node: NodeId, kind: &str, event: DomEvent) {
        let weak = self.downgrade();
        let owned_kind = kind.to_owned();
        let timer = self.schedule(self.config().debounce, move || {
            let Some(runtime) = Runtime::upgrade(&weak) else {
                return;
            };
            runtime
                .inner
                .pool
                .borrow_mut()
                .set_pending(node, &owned_kind, None);
            let mut event = event;
            runtime.fan_out(node, &owned_kind, &mut event);
        });
        let previous = self.inner.pool.borrow_mut().set_pending(node, kind, Some(timer));
        match previous {
            Some(previous) => {
                self.cancel_timer(previous);
                tracing::trace!(?node, kind, "debounce restarted");
            }
            None => tracing::trace!(?node, kind, "debounce started"),
        }
    }

    /// Deliver `event` to every subscriber present when the fan-out began.
    ///
    /// Subscribers that leave mid-fan-out are skipped; subscribers that join
    /// mid-fan-out wait for the next event.
    fn fan_out(&self, node: NodeId, kind: &str, event: &mut DomEvent) {
        let started = self.inner.pool.borrow_mut().begin_dispatch(node, kind);
        let Some((generation, len)) = started else {
            return;
        };
        for index in 0..len {
            let slot = self.inner.pool.borrow().slot(node, kind, index, generation);
            let key = match slot {
                Slot::Stop => break,
                Slot::Vacant => continue,
                Slot::Subscriber(key) => key,
            };
            let inner = self
                .inner
                .components
                .borrow()
                .get(key)
                .and_then(|weak| weak.upgrade());
            if let Some(inner) = inner {
                Component::from_inner(inner).trigger_dom_event(node, event);
            }
        }
        self.inner
            .pool
            .borrow_mut()
            .end_dispatch(node, kind, generation);
    }
}
