//! Server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use parlor_settings::ParlorSettings;

/// Configuration for the Parlor server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Maximum concurrent WebSocket connections.
    pub max_connections: usize,
    /// Name of the cookie carrying the session credential.
    pub session_cookie: String,
    /// Outbound queue depth per connection.
    pub send_queue_capacity: usize,
    /// Messages dropped on a full queue before the recipient is evicted.
    pub backpressure_drop_limit: u64,
    /// Interval between server-initiated Ping frames, in seconds.
    pub heartbeat_interval_secs: u64,
    /// Silence window after which an unresponsive client is evicted, in seconds.
    pub heartbeat_timeout_secs: u64,
    /// Grace period to flush queued sends while closing, in milliseconds.
    pub close_grace_ms: u64,
    /// Max inbound frame size in bytes.
    pub max_message_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            max_connections: 256,
            session_cookie: "session_username".into(),
            send_queue_capacity: 256,
            backpressure_drop_limit: 32,
            heartbeat_interval_secs: 30,
            heartbeat_timeout_secs: 90,
            close_grace_ms: 3_000,
            max_message_size: 64 * 1024,
        }
    }
}

impl ServerConfig {
    /// Build a config from loaded settings.
    #[must_use]
    pub fn from_settings(settings: &ParlorSettings) -> Self {
        Self {
            host: settings.server.host.clone(),
            port: settings.server.port,
            max_connections: settings.server.max_connections,
            session_cookie: settings.server.session_cookie.clone(),
            send_queue_capacity: settings.chat.send_queue_capacity,
            backpressure_drop_limit: settings.chat.backpressure_drop_limit,
            heartbeat_interval_secs: settings.chat.heartbeat_interval_ms.div_ceil(1000),
            heartbeat_timeout_secs: settings.chat.heartbeat_timeout_ms.div_ceil(1000),
            close_grace_ms: settings.chat.close_grace_ms,
            max_message_size: settings.chat.max_message_size,
        }
    }

    /// Heartbeat ping interval.
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    /// Heartbeat silence timeout.
    #[must_use]
    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_timeout_secs)
    }

    /// Close-flush grace period.
    #[must_use]
    pub fn close_grace(&self) -> Duration {
        Duration::from_millis(self.close_grace_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
