//! In-memory game server for exercising the supervisor without a network.
//!
//! # Example
//!
//! ```
//! use afk_warden_core::{SessionEvent, SupervisorSettings};
//! use afk_warden_session::testing::FakeServer;
//! use afk_warden_session::Supervisor;
//! use tokio::time::Instant;
//!
//! let server = FakeServer::new();
//! let mut supervisor = Supervisor::new("afkbot", SupervisorSettings::default(), server.clone());
//! let now = Instant::now();
//! supervisor.start(now);
//!
//! let id = supervisor.current().unwrap().id();
//! supervisor.handle_event(server.envelope(id, SessionEvent::Login), now);
//! assert_eq!(supervisor.failures().consecutive(), 0);
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use afk_warden_core::{
    Error, Identity, Occupant, Result, SessionEnvelope, SessionEvent, SessionId,
};

use crate::connection::{Connection, Connector, EventSender};

/// Snapshot of one connection the fake server accepted.
#[derive(Debug, Clone)]
pub struct FakeRecord {
    /// Session the connection belongs to
    pub session: SessionId,
    /// Identity it connected under
    pub identity: Identity,
    /// Whether the connection reports the play state
    pub playing: bool,
    /// Whether `quit` was called
    pub quit: bool,
    /// Chat lines sent
    pub chat: Vec<String>,
    /// Respawn requests
    pub respawns: u32,
    events: Option<EventSender>,
}

#[derive(Debug, Default)]
struct ServerState {
    roster: Vec<Occupant>,
    refusals: usize,
    connections: Vec<FakeRecord>,
}

/// Shared fake server. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct FakeServer {
    inner: Arc<Mutex<ServerState>>,
}

impl FakeServer {
    /// Create an empty server.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ServerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the roster of occupants not connected through this server.
    pub fn set_roster(&self, roster: Vec<Occupant>) {
        self.lock().roster = roster;
    }

    /// Refuse the next `count` connect calls.
    pub fn refuse_next(&self, count: usize) {
        self.lock().refusals = count;
    }

    /// Number of connections accepted so far.
    pub fn connect_count(&self) -> usize {
        self.lock().connections.len()
    }

    /// Snapshot of every accepted connection, oldest first.
    pub fn records(&self) -> Vec<FakeRecord> {
        self.lock().connections.clone()
    }

    /// Snapshot of one connection.
    pub fn record(&self, session: SessionId) -> Option<FakeRecord> {
        self.lock()
            .connections
            .iter()
            .find(|record| record.session == session)
            .cloned()
    }

    /// Force the play state of a connection.
    pub fn set_playing(&self, session: SessionId, playing: bool) {
        if let Some(record) = self.lock().connections.iter_mut().find(|r| r.session == session) {
            record.playing = playing;
        }
    }

    /// Build an envelope and update the connection's play state to match the event.
    pub fn envelope(&self, session: SessionId, event: SessionEvent) -> SessionEnvelope {
        let playing = match &event {
            SessionEvent::Login | SessionEvent::Spawn => Some(true),
            event if event.is_terminal() => Some(false),
            _ => None,
        };
        if let Some(playing) = playing {
            self.set_playing(session, playing);
        }
        SessionEnvelope::new(session, event)
    }

    /// Push an event through the connection's event channel.
    ///
    /// Returns false if the connection is unknown or has no channel.
    pub fn emit(&self, session: SessionId, event: SessionEvent) -> bool {
        let envelope = self.envelope(session, event);
        let sender = self
            .lock()
            .connections
            .iter()
            .find(|record| record.session == session)
            .and_then(|record| record.events.clone());
        match sender {
            Some(sender) => sender.send(envelope).is_ok(),
            None => false,
        }
    }
}

impl Connector for FakeServer {
    fn connect(
        &mut self,
        session: SessionId,
        identity: &Identity,
        events: EventSender,
    ) -> Result<Box<dyn Connection>> {
        let mut state = self.lock();
        if state.refusals > 0 {
            state.refusals -= 1;
            return Err(Error::ConnectFailure(format!(
                "connection refused for {identity}"
            )));
        }
        state.connections.push(FakeRecord {
            session,
            identity: identity.clone(),
            playing: false,
            quit: false,
            chat: Vec::new(),
            respawns: 0,
            events: Some(events),
        });
        drop(state);
        Ok(Box::new(FakeConnection {
            server: self.clone(),
            session,
        }))
    }
}

/// Connection handed out by [`FakeServer`].
#[derive(Debug)]
pub struct FakeConnection {
    server: FakeServer,
    session: SessionId,
}

impl FakeConnection {
    /// A connection on its own private server, for testing behaviors.
    pub fn detached() -> Self {
        let server = FakeServer::new();
        let session = SessionId::new();
        server.lock().connections.push(FakeRecord {
            session,
            identity: Identity::generate("fake", &mut rand::thread_rng()),
            playing: true,
            quit: false,
            chat: Vec::new(),
            respawns: 0,
            events: None,
        });
        Self { server, session }
    }

    /// Chat lines this connection sent.
    pub fn chat_log(&self) -> Vec<String> {
        self.server
            .record(self.session)
            .map(|record| record.chat)
            .unwrap_or_default()
    }

    fn with_record<T>(&self, f: impl FnOnce(&mut FakeRecord) -> T) -> Option<T> {
        let mut state = self.server.lock();
        state
            .connections
            .iter_mut()
            .find(|record| record.session == self.session)
            .map(f)
    }
}

impl Connection for FakeConnection {
    /// Every connection still on the server, then the configured roster.
    ///
    /// Like a real server, our own occupants show up as ordinary players.
    fn roster(&self) -> Vec<Occupant> {
        let state = self.server.lock();
        state
            .connections
            .iter()
            .filter(|record| !record.quit)
            .map(|record| Occupant::human(record.identity.as_str()))
            .chain(state.roster.iter().cloned())
            .collect()
    }

    fn is_playing(&self) -> bool {
        self.with_record(|record| record.playing && !record.quit)
            .unwrap_or(false)
    }

    fn chat(&mut self, message: &str) {
        self.with_record(|record| record.chat.push(message.to_string()));
    }

    fn respawn(&mut self) {
        self.with_record(|record| record.respawns += 1);
    }

    fn quit(&mut self) {
        self.with_record(|record| {
            record.quit = true;
            record.playing = false;
        });
    }
}
