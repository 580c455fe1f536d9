//! Consecutive failure tracking.
//!
//! Used for alerting only. Retries never stop and the reconnect delay never
//! grows; crossing the threshold just raises one loud log line.

/// Outcome of recording one failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailureRecord {
    /// Consecutive failures including this one
    pub consecutive: u32,
    /// This failure crossed the alert threshold
    pub alert: bool,
}

/// Counts consecutive failed session attempts.
#[derive(Debug, Clone)]
pub struct FailureTracker {
    consecutive: u32,
    threshold: u32,
    alerts: u64,
}

impl FailureTracker {
    /// Create a tracker that alerts at `threshold` consecutive failures.
    pub fn new(threshold: u32) -> Self {
        Self {
            consecutive: 0,
            threshold,
            alerts: 0,
        }
    }

    /// Record a failure.
    pub fn record_failure(&mut self) -> FailureRecord {
        self.consecutive = self.consecutive.saturating_add(1);
        let alert = self.consecutive == self.threshold;
        if alert {
            self.alerts += 1;
        }
        FailureRecord {
            consecutive: self.consecutive,
            alert,
        }
    }

    /// Reset after a successful login.
    pub fn reset(&mut self) {
        self.consecutive = 0;
    }

    /// Current consecutive failure count.
    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    /// Alert threshold.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Total alerts raised over the tracker's lifetime.
    pub fn alerts(&self) -> u64 {
        self.alerts
    }
}
