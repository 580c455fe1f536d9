//! One-shot timer slots.
//!
//! Each scheduled concern owns exactly one slot. Arming a slot replaces any
//! deadline it already held, so timers never pile up.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

/// One-shot timers owned by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Create a replacement session
    Reconnect,
    /// Rotate the occupant identity
    Rotation,
    /// Retire the outgoing handle at the end of a rotation overlap
    Handoff,
}

/// Holds at most one pending deadline.
#[derive(Debug, Clone, Default)]
pub struct TimerSlot {
    deadline: Option<Instant>,
}

impl TimerSlot {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the slot `delay` after `now`, replacing any previous deadline.
    pub fn arm(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    /// Cancel the pending deadline.
    pub fn clear(&mut self) {
        self.deadline = None;
    }

    /// Pending deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether a deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Whether the deadline has passed at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= now)
    }

    /// Take the deadline if it is due, disarming the slot.
    pub fn take_due(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }

    /// Resolve at the deadline; never resolves while the slot is empty.
    pub async fn wait(&self) {
        match self.deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}
