//! Liveness watchdog.
//!
//! Connections can go quiet without ever firing a terminal event. The
//! watchdog compares the last observed activity against a timeout; the
//! supervisor treats a stale session as failed and replaces it.

use std::time::Duration;

use tokio::time::Instant;

/// Decides whether the current session has gone silent.
#[derive(Debug, Clone, Copy)]
pub struct LivenessWatchdog {
    timeout: Duration,
}

impl LivenessWatchdog {
    /// Create a watchdog with the given liveness timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Liveness timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Time elapsed since `last_activity`.
    pub fn silence(&self, last_activity: Instant, now: Instant) -> Duration {
        now.saturating_duration_since(last_activity)
    }

    /// Whether the silence strictly exceeds the timeout.
    pub fn is_stale(&self, last_activity: Instant, now: Instant) -> bool {
        self.silence(last_activity, now) > self.timeout
    }
}
