//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`ParlorSettings::default()`]
//! 2. If `~/.parlor/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `PARLOR_*` environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::ParlorSettings;

/// Resolve the path to the settings file (`~/.parlor/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".parlor").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<ParlorSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<ParlorSettings> {
    let defaults = serde_json::to_value(ParlorSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: ParlorSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Integers must parse and fall within range; invalid values are silently
/// ignored (falling back to file/default).
pub fn apply_env_overrides(settings: &mut ParlorSettings) {
    if let Some(v) = read_env_string("PARLOR_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_env_u16("PARLOR_PORT") {
        settings.server.port = v;
    }
    if let Some(v) = read_env_usize("PARLOR_MAX_CONNECTIONS", 1, 100_000) {
        settings.server.max_connections = v;
    }
    if let Some(v) = read_env_string("PARLOR_SESSION_COOKIE") {
        settings.server.session_cookie = v;
    }
    if let Some(v) = read_env_u64("PARLOR_HEARTBEAT_INTERVAL_MS", 1_000, 600_000) {
        settings.chat.heartbeat_interval_ms = v;
    }
    if let Some(v) = read_env_u64("PARLOR_HEARTBEAT_TIMEOUT_MS", 1_000, 3_600_000) {
        settings.chat.heartbeat_timeout_ms = v;
    }
    if let Some(v) = read_env_usize("PARLOR_SEND_QUEUE_CAPACITY", 1, 65_536) {
        settings.chat.send_queue_capacity = v;
    }
    if let Some(v) = read_env_string("PARLOR_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u16(name: &str) -> Option<u16> {
    std::env::var(name).ok()?.parse().ok()
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    parse_in_range(&std::env::var(name).ok()?, min, max)
}

fn read_env_usize(name: &str, min: usize, max: usize) -> Option<usize> {
    let v = parse_in_range(&std::env::var(name).ok()?, min as u64, max as u64)?;
    usize::try_from(v).ok()
}

/// Parse an integer override, rejecting values outside `[min, max]`.
fn parse_in_range(raw: &str, min: u64, max: u64) -> Option<u64> {
    let v: u64 = raw.trim().parse().ok()?;
    (min..=max).contains(&v).then_some(v)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
