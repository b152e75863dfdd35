//! Settings types with compiled defaults.

use serde::{Deserialize, Serialize};

/// Root settings document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParlorSettings {
    /// Network and admission settings.
    pub server: ServerSettings,
    /// Per-connection chat tuning.
    pub chat: ChatSettings,
    /// Log output settings.
    pub logging: LoggingSettings,
}

/// Server network and admission settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port (0 for auto-assign).
    pub port: u16,
    /// Maximum concurrent WebSocket connections; upgrades past this bound
    /// are refused before registration.
    pub max_connections: usize,
    /// Name of the cookie carrying the session credential.
    pub session_cookie: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_connections: 256,
            session_cookie: "session_username".to_string(),
        }
    }
}

/// Per-connection chat tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatSettings {
    /// Outbound queue depth per connection.
    pub send_queue_capacity: usize,
    /// Messages dropped on a full queue before the recipient is evicted.
    pub backpressure_drop_limit: u64,
    /// Interval between server-initiated Ping frames, in milliseconds.
    pub heartbeat_interval_ms: u64,
    /// Silence window after which an unresponsive client is evicted,
    /// in milliseconds.
    pub heartbeat_timeout_ms: u64,
    /// Grace period to flush queued sends while closing, in milliseconds.
    pub close_grace_ms: u64,
    /// Maximum accepted inbound frame size in bytes.
    pub max_message_size: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            send_queue_capacity: 256,
            backpressure_drop_limit: 32,
            heartbeat_interval_ms: 30_000,
            heartbeat_timeout_ms: 90_000,
            close_grace_ms: 3_000,
            max_message_size: 64 * 1024,
        }
    }
}

/// Log output settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Log level filter (`error`, `warn`, `info`, `debug`, `trace`).
    pub level: String,
    /// Emit JSON log lines instead of the human-readable format.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
