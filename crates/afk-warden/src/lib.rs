//! AFK Warden binary support library.
//!
//! Everything `main` wires together: argument parsing, the log sink, the
//! health HTTP surface and the TCP connector.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod health;
pub mod logging;
pub mod tcp;

// Re-export commonly used types
pub use cli::Args;
pub use tcp::{TcpConnection, TcpConnector};
