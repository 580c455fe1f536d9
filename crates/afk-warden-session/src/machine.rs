//! Session state machine.
//!
//! [`transition`] is a pure function from the current state and an incoming
//! event to the next state plus a list of [`Effect`]s. The supervisor owns
//! the side effects; nothing here touches a connection or a clock.

use afk_warden_core::{FailureKind, SessionEvent, SessionState, WorldTick};

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Log a line attributed to the session
    Log(String),
    /// Stamp the liveness timestamp
    Touch,
    /// Reset the consecutive failure counter
    ResetFailures,
    /// Run post-login behaviors
    RunOnActive,
    /// Run per-tick behaviors
    RunOnTick(WorldTick),
    /// Ask the connection to respawn
    Respawn,
    /// The session ended unsuccessfully
    Terminate(FailureKind),
}

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// State after the event
    pub next: SessionState,
    /// Effects to execute, in order
    pub effects: Vec<Effect>,
}

impl Step {
    fn stay(state: SessionState, effects: Vec<Effect>) -> Self {
        Self {
            next: state,
            effects,
        }
    }

    fn terminate(kind: FailureKind, message: String) -> Self {
        Self {
            next: SessionState::Terminated,
            effects: vec![Effect::Log(message), Effect::Terminate(kind)],
        }
    }

    /// The failure this step ends the session with, if any.
    pub fn failure(&self) -> Option<FailureKind> {
        self.effects.iter().find_map(|effect| match effect {
            Effect::Terminate(kind) => Some(*kind),
            _ => None,
        })
    }
}

/// Apply `event` to a session in `state`.
pub fn transition(state: SessionState, event: &SessionEvent) -> Step {
    use SessionState::*;

    match (state, event) {
        (Terminated, _) => Step::stay(Terminated, Vec::new()),

        (Connecting, SessionEvent::Login) => activate("Logged in"),
        (Connecting, SessionEvent::Spawn) => activate("Spawned in the world"),
        (Active, SessionEvent::Login) => {
            Step::stay(Active, vec![Effect::Log("Logged in".into()), Effect::Touch])
        }
        (Active, SessionEvent::Spawn) => Step::stay(
            Active,
            vec![Effect::Log("Spawned in the world".into()), Effect::Touch],
        ),

        (Active, SessionEvent::Tick(tick)) => {
            Step::stay(Active, vec![Effect::Touch, Effect::RunOnTick(*tick)])
        }
        (state, SessionEvent::Tick(_) | SessionEvent::Chat { .. } | SessionEvent::Moved) => {
            Step::stay(state, vec![Effect::Touch])
        }
        (state, SessionEvent::Death) => Step::stay(
            state,
            vec![
                Effect::Log("Died, respawning".into()),
                Effect::Touch,
                Effect::Respawn,
            ],
        ),

        (_, SessionEvent::Kicked(reason)) => {
            Step::terminate(FailureKind::RemoteTermination, format!("Kicked: {reason}"))
        }
        (_, SessionEvent::Disconnected) => {
            Step::terminate(FailureKind::TransportLoss, "Disconnected".into())
        }
        (Connecting, SessionEvent::Error(err)) => Step::terminate(
            FailureKind::ConnectFailure,
            format!("Failed to connect: {err}"),
        ),
        (Active, SessionEvent::Error(err)) => {
            Step::terminate(FailureKind::ProtocolError, format!("Error: {err}"))
        }
    }
}

fn activate(message: &str) -> Step {
    Step {
        next: SessionState::Active,
        effects: vec![
            Effect::Log(message.to_string()),
            Effect::Touch,
            Effect::ResetFailures,
            Effect::RunOnActive,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_activates() {
        let step = transition(SessionState::Connecting, &SessionEvent::Login);
        assert_eq!(step.next, SessionState::Active);
        assert!(step.effects.contains(&Effect::ResetFailures));
        assert!(step.effects.contains(&Effect::Touch));
        assert!(step.effects.contains(&Effect::RunOnActive));
        assert_eq!(step.failure(), None);
    }

    #[test]
    fn test_spawn_confirms_login() {
        let step = transition(SessionState::Connecting, &SessionEvent::Spawn);
        assert_eq!(step.next, SessionState::Active);
        assert!(step.effects.contains(&Effect::ResetFailures));

        let step = transition(SessionState::Active, &SessionEvent::Spawn);
        assert_eq!(step.next, SessionState::Active);
        assert!(!step.effects.contains(&Effect::ResetFailures));
        assert!(!step.effects.contains(&Effect::RunOnActive));
    }

    #[test]
    fn test_connect_error_is_connect_failure() {
        let step = transition(
            SessionState::Connecting,
            &SessionEvent::Error("ECONNREFUSED".into()),
        );
        assert_eq!(step.next, SessionState::Terminated);
        assert_eq!(step.failure(), Some(FailureKind::ConnectFailure));
    }

    #[test]
    fn test_active_failures() {
        let cases = [
            (
                SessionEvent::Kicked("banned".into()),
                FailureKind::RemoteTermination,
                "Kicked: banned",
            ),
            (
                SessionEvent::Disconnected,
                FailureKind::TransportLoss,
                "Disconnected",
            ),
            (
                SessionEvent::Error("bad packet".into()),
                FailureKind::ProtocolError,
                "Error: bad packet",
            ),
        ];
        for (event, kind, message) in cases {
            let step = transition(SessionState::Active, &event);
            assert_eq!(step.next, SessionState::Terminated);
            assert_eq!(step.failure(), Some(kind));
            assert_eq!(step.effects[0], Effect::Log(message.to_string()));
        }
    }

    #[test]
    fn test_kick_while_connecting() {
        let step = transition(SessionState::Connecting, &SessionEvent::Kicked("full".into()));
        assert_eq!(step.next, SessionState::Terminated);
        assert_eq!(step.failure(), Some(FailureKind::RemoteTermination));
    }

    #[test]
    fn test_terminated_is_absorbing() {
        let events = [
            SessionEvent::Login,
            SessionEvent::Spawn,
            SessionEvent::Tick(WorldTick::default()),
            SessionEvent::Death,
            SessionEvent::Kicked("again".into()),
            SessionEvent::Disconnected,
            SessionEvent::Error("late".into()),
        ];
        for event in events {
            let step = transition(SessionState::Terminated, &event);
            assert_eq!(step.next, SessionState::Terminated);
            assert!(step.effects.is_empty(), "{event:?} produced effects");
        }
    }

    #[test]
    fn test_tick_touches_and_runs_behaviors() {
        let tick = WorldTick {
            time_of_day: Some(13500),
        };
        let step = transition(SessionState::Active, &SessionEvent::Tick(tick));
        assert_eq!(step.effects, vec![Effect::Touch, Effect::RunOnTick(tick)]);

        let step = transition(SessionState::Connecting, &SessionEvent::Tick(tick));
        assert_eq!(step.next, SessionState::Connecting);
        assert_eq!(step.effects, vec![Effect::Touch]);
    }

    #[test]
    fn test_death_respawns_without_terminating() {
        let step = transition(SessionState::Active, &SessionEvent::Death);
        assert_eq!(step.next, SessionState::Active);
        assert!(step.effects.contains(&Effect::Respawn));
        assert_eq!(step.failure(), None);
    }
}
