//! Session handle: one connection lifetime.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use afk_warden_core::{Identity, Result, RetireReason, SessionEvent, SessionId, SessionState};

use crate::connection::{Connection, Connector, EventSender};
use crate::machine::{transition, Step};

/// Passive record of one connection attempt and its lifetime.
///
/// The handle exclusively owns its connection. Dropping the handle quits the
/// connection, so no connection outlives the supervisor's reference to it.
pub struct SessionHandle {
    /// Session identifier
    id: SessionId,

    /// Identity the session connected under
    identity: Identity,

    /// Underlying protocol connection
    connection: Box<dyn Connection>,

    /// Creation time
    created_at: Instant,

    /// Last event observed from this session
    last_activity_at: Instant,

    /// Lifecycle state
    state: SessionState,
}

impl SessionHandle {
    /// Start a connection attempt and wrap it in a handle in `Connecting` state.
    pub fn open(
        connector: &mut dyn Connector,
        identity: Identity,
        events: EventSender,
        now: Instant,
    ) -> Result<Self> {
        let id = SessionId::new();
        debug!("Opening session: id={}, identity={}", id, identity);
        let connection = connector.connect(id, &identity, events)?;
        Ok(Self {
            id,
            identity,
            connection,
            created_at: now,
            last_activity_at: now,
            state: SessionState::Connecting,
        })
    }

    /// Get the session ID.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Get the identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Get the current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Get the creation time.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Get the last activity time.
    pub fn last_activity_at(&self) -> Instant {
        self.last_activity_at
    }

    /// Borrow the connection.
    pub fn connection(&self) -> &dyn Connection {
        self.connection.as_ref()
    }

    /// Borrow the connection mutably.
    pub fn connection_mut(&mut self) -> &mut dyn Connection {
        self.connection.as_mut()
    }

    /// Apply an event to the state machine, updating the state.
    ///
    /// Effects are returned for the caller to execute.
    pub fn apply(&mut self, event: &SessionEvent) -> Step {
        let step = transition(self.state, event);
        if step.next != self.state {
            debug!(
                "Session state changed: identity={}, {:?} → {:?}",
                self.identity, self.state, step.next
            );
        }
        self.state = step.next;
        step
    }

    /// Stamp activity.
    pub fn touch(&mut self, now: Instant) {
        self.last_activity_at = now;
    }

    /// Whether the session needs no replacement.
    ///
    /// Active sessions are healthy while the connection reports it is playing.
    /// Connecting sessions get `connect_timeout` to finish logging in.
    pub fn is_healthy(&self, now: Instant, connect_timeout: Duration) -> bool {
        match self.state {
            SessionState::Active => self.connection.is_playing(),
            SessionState::Connecting => {
                now.saturating_duration_since(self.created_at) <= connect_timeout
            }
            SessionState::Terminated => false,
        }
    }

    /// Explicitly retire the session: quit the connection and release it.
    pub fn retire(mut self, reason: RetireReason) {
        info!(
            "Retiring session: identity={}, reason={}",
            self.identity, reason
        );
        self.close();
    }

    /// Quit the connection and mark the handle terminated.
    pub fn close(&mut self) {
        self.state = SessionState::Terminated;
        self.connection.quit();
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.connection.quit();
    }
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("identity", &self.identity)
            .field("state", &self.state)
            .field("created_at", &self.created_at)
            .field("last_activity_at", &self.last_activity_at)
            .finish_non_exhaustive()
    }
}
