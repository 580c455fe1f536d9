//! Presence monitor.
//!
//! Automation must vacate whenever a genuine human is on the server. The
//! monitor filters the roster down to human occupants and tells the
//! supervisor whether to yield, reconnect, or do nothing.

use afk_warden_core::{Identity, Occupant};

/// What the supervisor should do after a presence poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceVerdict {
    /// Humans are present; retire the session
    Yield(Vec<String>),
    /// Nobody is present and the session is not playing; ensure a session
    Reconnect,
    /// Nothing to do
    Idle,
}

/// Stateless roster evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresenceMonitor;

impl PresenceMonitor {
    /// Create a new presence monitor.
    pub fn new() -> Self {
        Self
    }

    /// Names of human occupants, excluding our own identities and anything flagged automated.
    ///
    /// `ours` lists every identity the supervisor holds, which during a
    /// rotation overlap includes the outgoing one.
    pub fn humans(&self, roster: &[Occupant], ours: &[&Identity]) -> Vec<String> {
        roster
            .iter()
            .filter(|occupant| !ours.iter().any(|own| occupant.name == own.as_str()))
            .filter(|occupant| !occupant.is_automated)
            .map(|occupant| occupant.name.clone())
            .collect()
    }

    /// Evaluate a roster for a session whose health is `healthy`.
    pub fn evaluate(&self, roster: &[Occupant], ours: &[&Identity], healthy: bool) -> PresenceVerdict {
        let humans = self.humans(roster, ours);
        if !humans.is_empty() {
            PresenceVerdict::Yield(humans)
        } else if !healthy {
            PresenceVerdict::Reconnect
        } else {
            PresenceVerdict::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn own() -> Identity {
        Identity::parse("afkbot_AbCd1234").unwrap()
    }

    #[test]
    fn test_filters_self_and_automated() {
        let roster = vec![
            Occupant::human("afkbot_AbCd1234"),
            Occupant::automated("farmhand"),
            Occupant::human("steve"),
            Occupant::human("alex"),
        ];
        let humans = PresenceMonitor::new().humans(&roster, &[&own()]);
        assert_eq!(humans, vec!["steve".to_string(), "alex".to_string()]);
    }

    #[test]
    fn test_filters_every_own_identity() {
        let outgoing = Identity::parse("afkbot_ZyXw9876").unwrap();
        let roster = vec![
            Occupant::human("afkbot_ZyXw9876"),
            Occupant::human("afkbot_AbCd1234"),
        ];
        let monitor = PresenceMonitor::new();
        assert!(monitor.humans(&roster, &[&own(), &outgoing]).is_empty());
        assert_eq!(
            monitor.humans(&roster, &[&own()]),
            vec!["afkbot_ZyXw9876".to_string()]
        );
    }

    #[test]
    fn test_yield_when_human_present() {
        let roster = vec![Occupant::human("afkbot_AbCd1234"), Occupant::human("steve")];
        let verdict = PresenceMonitor::new().evaluate(&roster, &[&own()], true);
        assert_eq!(verdict, PresenceVerdict::Yield(vec!["steve".to_string()]));
    }

    #[test]
    fn test_yield_wins_over_reconnect() {
        let roster = vec![Occupant::human("steve")];
        let verdict = PresenceMonitor::new().evaluate(&roster, &[&own()], false);
        assert!(matches!(verdict, PresenceVerdict::Yield(_)));
    }

    #[test]
    fn test_reconnect_when_empty_and_unhealthy() {
        let roster = vec![Occupant::human("afkbot_AbCd1234"), Occupant::automated("other_bot")];
        let verdict = PresenceMonitor::new().evaluate(&roster, &[&own()], false);
        assert_eq!(verdict, PresenceVerdict::Reconnect);
    }

    #[test]
    fn test_idle_when_empty_and_healthy() {
        let verdict = PresenceMonitor::new().evaluate(&[], &[&own()], true);
        assert_eq!(verdict, PresenceVerdict::Idle);
    }
}
