//! # parlor-settings
//!
//! Layered configuration for the Parlor chat hub.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`ParlorSettings::default()`]
//! 2. **User file** — `~/.parlor/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `PARLOR_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::{ChatSettings, LoggingSettings, ParlorSettings, ServerSettings};

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = ParlorSettings::default();
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.max_connections, 256);
        assert_eq!(settings.server.session_cookie, "session_username");
        assert_eq!(settings.chat.send_queue_capacity, 256);
        assert_eq!(settings.chat.heartbeat_interval_ms, 30_000);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn deep_merge_re_exported() {
        let a = serde_json::json!({"x": 1});
        let b = serde_json::json!({"y": 2});
        let merged = deep_merge(a, b);
        assert_eq!(merged["x"], 1);
        assert_eq!(merged["y"], 2);
    }
}
