//! In-session behaviors.
//!
//! Behaviors are capabilities the supervisor invokes on an active session.
//! They never influence lifecycle decisions.

use afk_warden_core::WorldTick;

use crate::connection::Connection;

/// Time of day (in ticks) at which night begins.
pub const DUSK: u64 = 13_000;

/// Something to do inside an active session.
pub trait Behavior: Send {
    /// Called once when a session becomes active.
    fn on_active(&mut self, _connection: &mut dyn Connection) {}

    /// Called on every world tick of an active session.
    fn on_tick(&mut self, _connection: &mut dyn Connection, _tick: &WorldTick) {}
}

/// Says hello after logging in.
#[derive(Debug, Clone)]
pub struct Greeting {
    message: String,
}

impl Greeting {
    /// Greet with `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for Greeting {
    fn default() -> Self {
        Self::new("hello")
    }
}

impl Behavior for Greeting {
    fn on_active(&mut self, connection: &mut dyn Connection) {
        connection.chat(&self.message);
    }
}

/// Sets the time to day whenever the world clock reaches dusk.
#[derive(Debug, Clone, Copy, Default)]
pub struct NightSkip;

impl NightSkip {
    /// Create the behavior.
    pub fn new() -> Self {
        Self
    }
}

impl Behavior for NightSkip {
    fn on_tick(&mut self, connection: &mut dyn Connection, tick: &WorldTick) {
        if tick.time_of_day.is_some_and(|time| time >= DUSK) {
            connection.chat("/time set day");
        }
    }
}
