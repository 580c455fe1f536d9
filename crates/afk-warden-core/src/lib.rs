//! # afk-warden-core
//!
//! Core types for AFK Warden.
//!
//! This crate contains all fundamental types with **no internal dependencies**
//! on other afk-warden crates. It provides:
//!
//! - Occupant identities and their generator
//! - Session types (SessionId, SessionState, SessionEvent, Occupant)
//! - The failure and retirement taxonomy
//! - Configuration (WardenConfig, SupervisorSettings)
//! - Error types
//!
//! ## Architecture
//!
//! This is Layer 0 in the architecture - all other crates depend on this one,
//! but this crate has no dependencies on other afk-warden crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod identity;
pub mod session;

// Re-export commonly used types
pub use config::{SupervisorSettings, WardenConfig, DEFAULT_GAME_PORT, MAX_ROTATION_MINUTES};
pub use error::{Error, Result};
pub use identity::Identity;
pub use session::{
    FailureKind, Occupant, RetireReason, SessionEnvelope, SessionEvent, SessionId, SessionState,
    WorldTick,
};
