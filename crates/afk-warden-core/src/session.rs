//! Session types shared between the supervisor and connectors.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one session handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random session ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for SessionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a session handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// Connection attempt in flight, login not yet confirmed
    Connecting,
    /// Logged in and present in the world
    Active,
    /// Session ended; absorbing
    Terminated,
}

impl SessionState {
    /// Whether the state is terminal.
    pub fn is_terminated(self) -> bool {
        self == SessionState::Terminated
    }
}

/// World clock sample carried by a tick event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldTick {
    /// In-game time of day in ticks (0..24000), when the connector knows it
    pub time_of_day: Option<u64>,
}

/// Event emitted by a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// Login accepted by the server
    Login,
    /// Occupant spawned in the world
    Spawn,
    /// Periodic world tick
    Tick(WorldTick),
    /// Chat line observed
    Chat {
        /// Sender display name
        from: String,
        /// Message text
        message: String,
    },
    /// Occupant moved
    Moved,
    /// Occupant died
    Death,
    /// Server removed the occupant
    Kicked(String),
    /// Transport closed
    Disconnected,
    /// Protocol or transport error
    Error(String),
}

impl SessionEvent {
    /// Whether this event ends the session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionEvent::Kicked(_) | SessionEvent::Disconnected | SessionEvent::Error(_)
        )
    }
}

/// An event tagged with the session that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEnvelope {
    /// Originating session
    pub session: SessionId,
    /// The event
    pub event: SessionEvent,
}

impl SessionEnvelope {
    /// Create a new envelope.
    pub fn new(session: SessionId, event: SessionEvent) -> Self {
        Self { session, event }
    }
}

/// One entry of the server's occupant roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    /// Display name
    pub name: String,
    /// Whether the server flags this occupant as automated
    pub is_automated: bool,
}

impl Occupant {
    /// A human occupant.
    pub fn human(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_automated: false,
        }
    }

    /// An automated occupant.
    pub fn automated(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_automated: true,
        }
    }
}

/// Why a session ended unsuccessfully. Every kind is recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Session could not be established
    ConnectFailure,
    /// Server kicked the occupant
    RemoteTermination,
    /// Transport dropped
    TransportLoss,
    /// Runtime error on an established session
    ProtocolError,
    /// Session stopped producing events
    LivenessTimeout,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::ConnectFailure => "connect failure",
            FailureKind::RemoteTermination => "remote termination",
            FailureKind::TransportLoss => "transport loss",
            FailureKind::ProtocolError => "protocol error",
            FailureKind::LivenessTimeout => "liveness timeout",
        };
        f.write_str(name)
    }
}

/// Why the supervisor deliberately retired a session. Never counted as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RetireReason {
    /// A human occupant is present
    HumanPresent,
    /// Identity rotation finished its overlap window
    RotationHandoff,
    /// Replaced by a fresh session
    Replaced,
    /// Supervisor shutting down
    Shutdown,
}

impl std::fmt::Display for RetireReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RetireReason::HumanPresent => "human occupant present",
            RetireReason::RotationHandoff => "rotation handoff",
            RetireReason::Replaced => "replaced",
            RetireReason::Shutdown => "shutdown",
        };
        f.write_str(name)
    }
}
