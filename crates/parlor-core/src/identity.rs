//! Resolved account identity bound to a connection.

use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// Identity record resolved by the identity binder when a connection is
/// accepted.
///
/// Immutable for the lifetime of the connection it is bound to; a client
/// picks up profile changes only by reconnecting. Always server-resolved —
/// nothing in this struct ever comes from a client-supplied field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable account identifier.
    pub user_id: UserId,
    /// Name shown next to chat messages.
    pub display_name: String,
    /// Avatar image URL, if the account has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Identity {
    /// Create an identity with no avatar.
    #[must_use]
    pub fn new(user_id: impl Into<UserId>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
            avatar_url: None,
        }
    }

    /// Attach an avatar URL.
    #[must_use]
    pub fn with_avatar(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
