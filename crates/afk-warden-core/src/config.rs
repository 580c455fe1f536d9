//! Configuration types for AFK Warden.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::Path;
use std::time::Duration;

use crate::{Error, Identity, Result};

/// Default game server port.
pub const DEFAULT_GAME_PORT: u16 = 25565;

/// Longest accepted rotation interval: one week.
pub const MAX_ROTATION_MINUTES: u64 = 7 * 24 * 60;

/// Warden configuration loaded from a JSON file.
///
/// ```json
/// { "ip": "play.example.com", "name": "afkbot", "auto-night-skip": "true" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WardenConfig {
    /// Game server host, optionally `host:port`
    pub ip: String,
    /// Base label for generated identities
    pub name: String,
    /// Skip the night by chat command once the world clock reaches dusk
    #[serde(default, with = "string_bool")]
    pub auto_night_skip: bool,
    /// Explicit game server port; overrides a port given in `ip`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Append-only log file path
    #[serde(default = "default_log_file")]
    pub log_file: String,
    /// Supervisor timings
    #[serde(default)]
    pub supervisor: SupervisorSettings,
}

fn default_log_file() -> String {
    "bot.log".to_string()
}

impl WardenConfig {
    /// Minimal configuration with default settings.
    pub fn new(ip: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            name: name.into(),
            auto_night_skip: false,
            port: None,
            log_file: default_log_file(),
            supervisor: SupervisorSettings::default(),
        }
    }

    /// Load configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: WardenConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.ip.trim().is_empty() {
            return Err(Error::Config("ip cannot be empty".to_string()));
        }
        Identity::validate_base(&self.name)
            .map_err(|e| Error::Config(format!("name: {e}")))?;
        if self.port == Some(0) {
            return Err(Error::Config("port must be > 0".to_string()));
        }
        self.supervisor.validate()
    }

    /// Resolve the game server address as `(host, port)`.
    pub fn server_address(&self) -> (String, u16) {
        let (host, inline_port) = match self.ip.rsplit_once(':') {
            Some((host, port)) => match port.parse::<u16>() {
                Ok(port) => (host.to_string(), Some(port)),
                Err(_) => (self.ip.clone(), None),
            },
            None => (self.ip.clone(), None),
        };
        let port = self.port.or(inline_port).unwrap_or(DEFAULT_GAME_PORT);
        (host, port)
    }
}

/// Timing and threshold settings for the lifecycle supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SupervisorSettings {
    /// Liveness watchdog poll interval
    pub watchdog_interval_secs: u64,
    /// Silence longer than this forces recovery
    pub liveness_timeout_secs: u64,
    /// Presence monitor poll interval
    pub presence_interval_secs: u64,
    /// Heartbeat log interval
    pub heartbeat_interval_secs: u64,
    /// Lower bound of the identity rotation interval
    pub rotation_min_minutes: u64,
    /// Upper bound of the identity rotation interval
    pub rotation_max_minutes: u64,
    /// Lower bound of the rotation overlap window
    pub overlap_min_secs: u64,
    /// Upper bound of the rotation overlap window
    pub overlap_max_secs: u64,
    /// Delay before reconnecting after a session ends
    pub reconnect_delay_secs: u64,
    /// Delay before retrying after a connect call fails outright
    pub retry_delay_secs: u64,
    /// How long a connecting session may wait for login before it is replaced
    pub connect_timeout_secs: u64,
    /// Consecutive failures that raise the alert
    pub max_failures: u32,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            watchdog_interval_secs: 5,
            liveness_timeout_secs: 10,
            presence_interval_secs: 5,
            heartbeat_interval_secs: 60,
            rotation_min_minutes: 60,
            rotation_max_minutes: 120,
            overlap_min_secs: 5,
            overlap_max_secs: 10,
            reconnect_delay_secs: 2,
            retry_delay_secs: 5,
            connect_timeout_secs: 10,
            max_failures: 10,
        }
    }
}

impl SupervisorSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("watchdog-interval-secs", self.watchdog_interval_secs),
            ("liveness-timeout-secs", self.liveness_timeout_secs),
            ("presence-interval-secs", self.presence_interval_secs),
            ("heartbeat-interval-secs", self.heartbeat_interval_secs),
            ("rotation-min-minutes", self.rotation_min_minutes),
            ("connect-timeout-secs", self.connect_timeout_secs),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(Error::Config(format!("supervisor.{name} must be > 0")));
            }
        }
        if self.max_failures == 0 {
            return Err(Error::Config(
                "supervisor.max-failures must be > 0".to_string(),
            ));
        }
        if self.rotation_max_minutes > MAX_ROTATION_MINUTES {
            return Err(Error::Config(format!(
                "supervisor.rotation-max-minutes must be <= {MAX_ROTATION_MINUTES}"
            )));
        }
        if self.rotation_min_minutes > self.rotation_max_minutes {
            return Err(Error::Config(
                "supervisor.rotation-min-minutes exceeds rotation-max-minutes".to_string(),
            ));
        }
        if self.overlap_min_secs > self.overlap_max_secs {
            return Err(Error::Config(
                "supervisor.overlap-min-secs exceeds overlap-max-secs".to_string(),
            ));
        }
        Ok(())
    }

    /// Watchdog poll interval.
    pub fn watchdog_interval(&self) -> Duration {
        Duration::from_secs(self.watchdog_interval_secs)
    }

    /// Liveness timeout.
    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_secs(self.liveness_timeout_secs)
    }

    /// Presence poll interval.
    pub fn presence_interval(&self) -> Duration {
        Duration::from_secs(self.presence_interval_secs)
    }

    /// Heartbeat log interval.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    /// Rotation interval bounds.
    pub fn rotation_range(&self) -> (Duration, Duration) {
        (
            Duration::from_secs(self.rotation_min_minutes.saturating_mul(60)),
            Duration::from_secs(self.rotation_max_minutes.saturating_mul(60)),
        )
    }

    /// Overlap window bounds.
    pub fn overlap_range(&self) -> (Duration, Duration) {
        (
            Duration::from_secs(self.overlap_min_secs),
            Duration::from_secs(self.overlap_max_secs),
        )
    }

    /// Reactive reconnect delay.
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    /// Proactive retry delay.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// `"true"`/`"false"` strings as booleans. Plain JSON booleans are accepted too.
mod string_bool {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "true" } else { "false" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
        match Flag::deserialize(deserializer)? {
            Flag::Bool(value) => Ok(value),
            Flag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" | "" => Ok(false),
                other => Err(serde::de::Error::custom(format!(
                    "expected \"true\" or \"false\", got {other:?}"
                ))),
            },
        }
    }
}
