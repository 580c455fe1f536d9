//! Error types for AFK Warden.

use thiserror::Error;

/// Main error type for AFK Warden operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Could not establish a session with the game server
    #[error("Connect failure: {0}")]
    ConnectFailure(String),

    /// Identity string does not have the expected shape
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// Identity base label is unusable
    #[error("Invalid identity base: {0:?}")]
    InvalidIdentityBase(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
