//! Identity rotation timing.
//!
//! A long-lived identity is a detectable pattern, so the supervisor swaps it
//! every 60-120 minutes. The new session connects first and the old one is
//! only retired after a short overlap window.

use std::time::Duration;

use rand::Rng;

use afk_warden_core::SupervisorSettings;

/// Draws randomized rotation intervals and overlap windows.
#[derive(Debug, Clone, Copy)]
pub struct RotationScheduler {
    interval: (Duration, Duration),
    overlap: (Duration, Duration),
}

impl RotationScheduler {
    /// Create a scheduler from explicit bounds (inclusive).
    pub fn new(interval: (Duration, Duration), overlap: (Duration, Duration)) -> Self {
        Self { interval, overlap }
    }

    /// Create a scheduler from supervisor settings.
    pub fn from_settings(settings: &SupervisorSettings) -> Self {
        Self::new(settings.rotation_range(), settings.overlap_range())
    }

    /// Time until the next rotation.
    pub fn next_interval<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        uniform(rng, self.interval)
    }

    /// How long the outgoing session stays connected after its replacement starts.
    pub fn overlap<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        uniform(rng, self.overlap)
    }
}

impl Default for RotationScheduler {
    fn default() -> Self {
        Self::from_settings(&SupervisorSettings::default())
    }
}

fn uniform<R: Rng + ?Sized>(rng: &mut R, (min, max): (Duration, Duration)) -> Duration {
    let min_ms = min.as_millis() as u64;
    let max_ms = (max.as_millis() as u64).max(min_ms);
    Duration::from_millis(rng.gen_range(min_ms..=max_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_interval_within_bounds() {
        let scheduler = RotationScheduler::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let interval = scheduler.next_interval(&mut rng);
            assert!(interval >= Duration::from_secs(60 * 60));
            assert!(interval <= Duration::from_secs(120 * 60));
        }
    }

    #[test]
    fn test_overlap_within_bounds() {
        let scheduler = RotationScheduler::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let overlap = scheduler.overlap(&mut rng);
            assert!(overlap >= Duration::from_secs(5));
            assert!(overlap <= Duration::from_secs(10));
        }
    }

    #[test]
    fn test_degenerate_range() {
        let fixed = Duration::from_secs(7);
        let scheduler = RotationScheduler::new((fixed, fixed), (fixed, fixed));
        let mut rng = rand::thread_rng();
        assert_eq!(scheduler.next_interval(&mut rng), fixed);
        assert_eq!(scheduler.overlap(&mut rng), fixed);
    }

    #[test]
    fn test_intervals_vary() {
        let scheduler = RotationScheduler::default();
        let mut rng = StdRng::seed_from_u64(1);
        let first = scheduler.next_interval(&mut rng);
        let varied = (0..20).any(|_| scheduler.next_interval(&mut rng) != first);
        assert!(varied);
    }
}
