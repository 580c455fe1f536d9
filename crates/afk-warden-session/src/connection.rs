//! Seams to the game protocol client.
//!
//! The supervisor never speaks the game protocol. It asks a [`Connector`] for
//! a [`Connection`] and observes the events the connection pushes into the
//! shared [`EventSender`].

use tokio::sync::mpsc;

use afk_warden_core::{Identity, Occupant, Result, SessionEnvelope, SessionId};

/// Channel that connections push their events into.
pub type EventSender = mpsc::UnboundedSender<SessionEnvelope>;

/// Receiving side of the event channel, drained by the supervisor.
pub type EventReceiver = mpsc::UnboundedReceiver<SessionEnvelope>;

/// Opens connections to the game server.
pub trait Connector: Send {
    /// Start a connection attempt under `identity`.
    ///
    /// Must return promptly; the outcome of the attempt is reported later
    /// through `events`, tagged with `session`. An `Err` here means the
    /// attempt could not even be started.
    fn connect(
        &mut self,
        session: SessionId,
        identity: &Identity,
        events: EventSender,
    ) -> Result<Box<dyn Connection>>;
}

/// One live connection, exclusively owned by a session handle.
pub trait Connection: Send {
    /// Current occupant roster, including the connection's own occupant.
    fn roster(&self) -> Vec<Occupant>;

    /// Best-effort check that the connection is in the in-world play state.
    fn is_playing(&self) -> bool;

    /// Send a chat line.
    fn chat(&mut self, message: &str);

    /// Respawn after death.
    fn respawn(&mut self);

    /// Leave the server and release resources. Must be idempotent.
    fn quit(&mut self);
}
