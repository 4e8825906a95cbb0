//! One-shot timers on the tokio clock.
//!
//! The queue stores deadlines only; nothing runs until the host calls
//! [`Runtime::run_due_timers`] or awaits [`Runtime::run_timers_until_idle`].
//! Under a paused tokio clock, tests drive timers with
//! `tokio::time::advance`.

use std::time::Duration;

use slotmap::{new_key_type, SlotMap};
use tokio::time::Instant;

use crate::runtime::Runtime;

new_key_type! {
    /// Handle to a scheduled timer.
    pub struct TimerId;
}

pub type TimerCallback = Box<dyn FnOnce()>;

struct Timer {
    deadline: Instant,
    seq: u64,
    callback: TimerCallback,
}

#[derive(Default)]
pub(crate) struct TimerQueue {
    timers: SlotMap<TimerId, Timer>,
    seq: u64,
}

impl TimerQueue {
    pub(crate) fn schedule(&mut self, delay: Duration, callback: TimerCallback) -> TimerId {
        self.seq += 1;
        self.timers.insert(Timer {
            deadline: Instant::now() + delay,
            seq: self.seq,
            callback,
        })
    }

    pub(crate) fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(id).is_some()
    }

    pub(crate) fn contains(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.timers.len()
    }

    pub(crate) fn clear(&mut self) {
        self.timers.clear();
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.timers.values().map(|t| t.deadline).min()
    }

    /// Remove and return the earliest timer due at `now`. Ties go to the
    /// timer scheduled first.
    pub(crate) fn pop_due(&mut self, now: Instant) -> Option<TimerCallback> {
        let (id, _) = self
            .timers
            .iter()
            .filter(|(_, t)| t.deadline <= now)
            .min_by_key(|(_, t)| (t.deadline, t.seq))?;
        self.timers.remove(id).map(|t| t.callback)
    }
}

impl Runtime {
    /// Schedule `callback` to run once after `delay`.
    pub fn schedule(&self, delay: Duration, callback: impl FnOnce() + 'static) -> TimerId {
        self.inner
            .timers
            .borrow_mut()
            .schedule(delay, Box::new(callback))
    }

    /// Cancel a pending timer. Returns `false` if it already ran or was
    /// cancelled.
    pub fn cancel_timer(&self, id: TimerId) -> bool {
        self.inner.timers.borrow_mut().cancel(id)
    }

    pub fn is_timer_pending(&self, id: TimerId) -> bool {
        self.inner.timers.borrow().contains(id)
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// Run every timer whose deadline has passed. Callbacks may schedule or
    /// cancel timers. Returns how many ran.
    pub fn run_due_timers(&self) -> usize {
        let now = Instant::now();
        let mut ran = 0;
        loop {
            let due = self.inner.timers.borrow_mut().pop_due(now);
            let Some(callback) = due else {
                break;
            };
            callback();
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!(ran, "ran due timers");
        }
        ran
    }

    /// Sleep until each pending deadline and run it, until no timers remain.
    pub async fn run_timers_until_idle(&self) {
        loop {
            let next = self.inner.timers.borrow().next_deadline();
            let Some(deadline) = next else {
                break;
            };
            tokio::time::sleep_until(deadline).await;
            self.run_due_timers();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[tokio::test(start_paused = true)]
    async fn timers_run_in_deadline_order() {
        let runtime = Runtime::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for (delay, label) in [(30, "c"), (10, "a"), (20, "b")] {
            let log = Rc::clone(&log);
            runtime.schedule(Duration::from_millis(delay), move || log.borrow_mut().push(label));
        }
        assert_eq!(runtime.run_due_timers(), 0);
        tokio::time::advance(Duration::from_millis(25)).await;
        assert_eq!(runtime.run_due_timers(), 2);
        assert_eq!(*log.borrow(), vec!["a", "b"]);
        runtime.run_timers_until_idle().await;
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
        assert_eq!(runtime.pending_timers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_runs() {
        let runtime = Runtime::new();
        let hit = Rc::new(RefCell::new(false));
        let h = Rc::clone(&hit);
        let id = runtime.schedule(Duration::from_millis(5), move || *h.borrow_mut() = true);
        assert!(runtime.is_timer_pending(id));
        assert!(runtime.cancel_timer(id));
        assert!(!runtime.cancel_timer(id));
        tokio::time::advance(Duration::from_millis(10)).await;
        assert_eq!(runtime.run_due_timers(), 0);
        assert!(!*hit.borrow());
    }
}
