//! Collaborator traits consumed by the identity binder.
//!
//! Credential issuance and profile storage live in external services; the
//! hub only ever reads them through these two traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use parlor_core::UserId;

/// Validates a session credential and resolves the account it belongs to.
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    /// Resolve a credential to an account ID, or `None` if the credential
    /// is unknown, expired, or malformed.
    async fn validate(&self, credential: &str) -> Option<UserId>;
}

/// Profile fields supplied by the external profile store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Name shown next to chat messages.
    pub display_name: String,
    /// Avatar image URL, if one was uploaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Looks up profile data for an account.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Fetch the profile for an account, or `None` if the directory has no
    /// record of it.
    async fn profile(&self, user_id: &UserId) -> Option<Profile>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
