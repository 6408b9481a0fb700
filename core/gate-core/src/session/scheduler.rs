//! One-shot expiry timers.
//!
//! The gate never sleeps itself. It hands an [`ExpiryTimer`] to a
//! [`Scheduler`], and whoever drives the event loop feeds fired timers back
//! through [`SessionGate::handle_expiry`](super::SessionGate::handle_expiry).
//! [`TimerQueue`] serves both roles: tests drain it against a
//! [`ManualClock`](super::ManualClock), the CLI sleeps until its next
//! deadline.

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// A pending session expiry.
///
/// `session_start_ms` is the identity of the session the timer was armed
/// for; a timer whose session has since been replaced must not fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryTimer {
    pub id: TimerId,
    pub session_start_ms: i64,
    pub due_at_ms: i64,
}

pub trait Scheduler {
    fn schedule(&mut self, timer: ExpiryTimer);
    fn cancel(&mut self, id: TimerId);
}

/// Pending timers ordered by deadline. Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    pending: Rc<RefCell<Vec<ExpiryTimer>>>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Vec<ExpiryTimer> {
        self.pending.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Earliest pending timer without removing it.
    pub fn next(&self) -> Option<ExpiryTimer> {
        self.pending.borrow().first().copied()
    }

    /// Removes and returns every timer due at or before `now_ms`, earliest first.
    pub fn take_due(&self, now_ms: i64) -> Vec<ExpiryTimer> {
        let mut pending = self.pending.borrow_mut();
        let split = pending.partition_point(|timer| timer.due_at_ms <= now_ms);
        pending.drain(..split).collect()
    }
}

impl Scheduler for TimerQueue {
    fn schedule(&mut self, timer: ExpiryTimer) {
        let mut pending = self.pending.borrow_mut();
        let at = pending.partition_point(|t| t.due_at_ms <= timer.due_at_ms);
        pending.insert(at, timer);
    }

    fn cancel(&mut self, id: TimerId) {
        self.pending.borrow_mut().retain(|timer| timer.id != id);
    }
}
