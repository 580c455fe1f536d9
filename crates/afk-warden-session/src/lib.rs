//! # afk-warden-session
//!
//! Session lifecycle supervision for AFK Warden.
//!
//! This crate provides:
//! - The connector seam to the game protocol client
//! - Session handles and the session state machine
//! - Liveness watchdog, presence monitor, failure tracker
//! - Identity rotation with an overlap window
//! - The supervisor that ties them together
//!
//! ## Architecture
//!
//! This is Layer 1 in the architecture - it depends on afk-warden-core and
//! knows nothing about the concrete transport.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backoff;
pub mod behavior;
pub mod connection;
pub mod handle;
pub mod machine;
pub mod presence;
pub mod rotation;
pub mod supervisor;
pub mod testing;
pub mod timer;
pub mod watchdog;

// Re-export commonly used types
pub use backoff::{FailureRecord, FailureTracker};
pub use behavior::{Behavior, Greeting, NightSkip};
pub use connection::{Connection, Connector, EventReceiver, EventSender};
pub use handle::SessionHandle;
pub use machine::{transition, Effect, Step};
pub use presence::{PresenceMonitor, PresenceVerdict};
pub use rotation::RotationScheduler;
pub use supervisor::{Supervisor, SupervisorState};
pub use timer::{TimerKind, TimerSlot};
pub use watchdog::LivenessWatchdog;
