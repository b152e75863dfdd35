//! Wire-level chat message envelope and inbound frame normalization.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::Identity;

/// The structured message broadcast to every chat participant.
///
/// Serialized as UTF-8 JSON text with exactly these four fields. The
/// timestamp is assigned by the broadcaster when the message is accepted —
/// never by the sending client — so there is a single ordering authority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Sender display name.
    pub username: String,
    /// Sender avatar URL (empty string when the account has none).
    pub photo_url: String,
    /// Message body, already trimmed.
    pub text: String,
    /// Server-assigned wall-clock time, formatted `HH:MM` (UTC).
    pub timestamp: String,
}

impl MessageEnvelope {
    /// Build an envelope from a sender's bound identity and accepted text.
    #[must_use]
    pub fn new(sender: &Identity, text: impl Into<String>, accepted_at: DateTime<Utc>) -> Self {
        Self {
            username: sender.display_name.clone(),
            photo_url: sender.avatar_url.clone().unwrap_or_default(),
            text: text.into(),
            timestamp: accepted_at.format("%H:%M").to_string(),
        }
    }
}

/// Extract the message body from an inbound client frame.
///
/// The chat page sends the raw text body, but the legacy page wrapped it as
/// `{"text": "..."}` — both shapes are accepted. Anything else (non-object
/// JSON, an object without a string `text` field) is treated as raw text.
#[must_use]
pub fn inbound_text(frame: &str) -> Cow<'_, str> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(frame) {
        if let Some(text) = value.get("text").and_then(|t| t.as_str()) {
            return Cow::Owned(text.to_owned());
        }
    }
    Cow::Borrowed(frame)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ann() -> Identity {
        Identity::new("u1", "Ann").with_avatar("/a.png")
    }

    #[test]
    fn envelope_carries_sender_identity() {
        let at = Utc.with_ymd_and_hms(2026, 8, 7, 15, 4, 30).unwrap();
        let env = MessageEnvelope::new(&ann(), "hi", at);
        assert_eq!(env.username, "Ann");
        assert_eq!(env.photo_url, "/a.png");
        assert_eq!(env.text, "hi");
    }

    #[test]
    fn timestamp_is_hour_minute() {
        let at = Utc.with_ymd_and_hms(2026, 8, 7, 9, 5, 59).unwrap();
        let env = MessageEnvelope::new(&ann(), "hi", at);
        assert_eq!(env.timestamp, "09:05");
    }

    #[test]
    fn missing_avatar_becomes_empty_string() {
        let env = MessageEnvelope::new(&Identity::new("u2", "Bo"), "yo", Utc::now());
        assert_eq!(env.photo_url, "");
    }

    #[test]
    fn wire_format_has_exactly_four_fields() {
        let env = MessageEnvelope::new(&ann(), "hi", Utc::now());
        let json = serde_json::to_string(&env).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert!(obj.contains_key("username"));
        assert!(obj.contains_key("photo_url"));
        assert!(obj.contains_key("text"));
        assert!(obj.contains_key("timestamp"));
    }

    #[test]
    fn serde_roundtrip() {
        let env = MessageEnvelope::new(&ann(), "hello there", Utc::now());
        let json = serde_json::to_string(&env).unwrap();
        let back: MessageEnvelope = serde_json::from_str(&json).unwrap();
        assert_eq!(back, env);
    }

    #[test]
    fn inbound_raw_text_passes_through() {
        assert_eq!(inbound_text("hello"), "hello");
    }

    #[test]
    fn inbound_legacy_json_unwrapped() {
        assert_eq!(inbound_text(r#"{"text":"hello"}"#), "hello");
    }

    #[test]
    fn inbound_json_without_text_field_is_raw() {
        let frame = r#"{"body":"hello"}"#;
        assert_eq!(inbound_text(frame), frame);
    }

    #[test]
    fn inbound_json_array_is_raw() {
        assert_eq!(inbound_text("[1,2,3]"), "[1,2,3]");
    }

    #[test]
    fn inbound_non_string_text_field_is_raw() {
        let frame = r#"{"text":42}"#;
        assert_eq!(inbound_text(frame), frame);
    }

    #[test]
    fn inbound_bare_number_is_raw() {
        // Valid JSON, but not an object with a text field.
        assert_eq!(inbound_text("42"), "42");
    }

    #[test]
    fn inbound_escaped_text_unescaped() {
        assert_eq!(inbound_text(r#"{"text":"say \"hi\""}"#), r#"say "hi""#);
    }
}
