//! Transport-level connector.
//!
//! Holds a plain TCP connection to the configured game server and reports
//! its liveness as session events. It does not speak the game protocol: a
//! successful connect counts as login, the open socket produces periodic
//! ticks, and the roster is always empty.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tracing::{debug, info};

use afk_warden_core::{
    Error, Identity, Occupant, Result, SessionEnvelope, SessionEvent, SessionId, WorldTick,
};
use afk_warden_session::{Connection, Connector, EventSender};

/// Interval between keepalive ticks while the socket is open.
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(1);

/// Connects to `host:port` over TCP.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    host: String,
    port: u16,
    connect_timeout: Duration,
    keepalive: Duration,
}

impl TcpConnector {
    /// Create a connector for `host:port`.
    pub fn new(host: impl Into<String>, port: u16, connect_timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout,
            keepalive: KEEPALIVE_INTERVAL,
        }
    }

    /// Override the keepalive tick interval.
    pub fn with_keepalive(mut self, keepalive: Duration) -> Self {
        self.keepalive = keepalive;
        self
    }

    /// Target address as `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Connector for TcpConnector {
    fn connect(
        &mut self,
        session: SessionId,
        identity: &Identity,
        events: EventSender,
    ) -> Result<Box<dyn Connection>> {
        let runtime = Handle::try_current()
            .map_err(|e| Error::ConnectFailure(format!("no async runtime: {e}")))?;

        info!("Connecting {} to {}", identity, self.address());
        let playing = Arc::new(AtomicBool::new(false));
        let task = runtime.spawn(drive(
            self.clone(),
            session,
            events,
            Arc::clone(&playing),
        ));

        Ok(Box::new(TcpConnection {
            identity: identity.clone(),
            playing,
            task,
        }))
    }
}

fn emit(events: &EventSender, session: SessionId, event: SessionEvent) {
    // The supervisor may already be gone during shutdown.
    let _ = events.send(SessionEnvelope::new(session, event));
}

async fn drive(
    connector: TcpConnector,
    session: SessionId,
    events: EventSender,
    playing: Arc<AtomicBool>,
) {
    let address = (connector.host.as_str(), connector.port);
    let mut stream = match timeout(connector.connect_timeout, TcpStream::connect(address)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(err)) => {
            emit(&events, session, SessionEvent::Error(err.to_string()));
            return;
        }
        Err(_) => {
            emit(
                &events,
                session,
                SessionEvent::Error(format!(
                    "connect timed out after {}s",
                    connector.connect_timeout.as_secs()
                )),
            );
            return;
        }
    };

    playing.store(true, Ordering::SeqCst);
    emit(&events, session, SessionEvent::Login);
    emit(&events, session, SessionEvent::Spawn);

    let mut keepalive = interval_at(Instant::now() + connector.keepalive, connector.keepalive);
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut buf = [0u8; 4096];

    loop {
        tokio::select! {
            read = stream.read(&mut buf) => match read {
                Ok(0) => {
                    playing.store(false, Ordering::SeqCst);
                    emit(&events, session, SessionEvent::Disconnected);
                    return;
                }
                Ok(n) => {
                    debug!("Received {} bytes: session={}", n, session);
                    emit(&events, session, SessionEvent::Tick(WorldTick::default()));
                }
                Err(err) => {
                    playing.store(false, Ordering::SeqCst);
                    emit(&events, session, SessionEvent::Error(err.to_string()));
                    return;
                }
            },
            _ = keepalive.tick() => emit(&events, session, SessionEvent::Tick(WorldTick::default())),
        }
    }
}

/// Live TCP connection. Quitting aborts the I/O task and closes the socket.
#[derive(Debug)]
pub struct TcpConnection {
    identity: Identity,
    playing: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl Connection for TcpConnection {
    fn roster(&self) -> Vec<Occupant> {
        Vec::new()
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    fn chat(&mut self, message: &str) {
        debug!("Chat not carried over raw transport: identity={}, {:?}", self.identity, message);
    }

    fn respawn(&mut self) {
        debug!("Respawn not carried over raw transport: identity={}", self.identity);
    }

    fn quit(&mut self) {
        self.playing.store(false, Ordering::SeqCst);
        self.task.abort();
    }
}
