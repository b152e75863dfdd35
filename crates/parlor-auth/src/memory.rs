//! In-process account store.
//!
//! The original deployment kept its users in an in-process map owned by the
//! login handlers; this mirrors that arrangement behind the collaborator
//! traits so the hub can run without an external account service. Real
//! deployments swap in networked implementations of the same traits.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use parlor_core::UserId;

use crate::traits::{CredentialValidator, Profile, ProfileDirectory};

/// In-memory sessions and profiles.
#[derive(Default)]
pub struct MemoryAccounts {
    sessions: RwLock<HashMap<String, UserId>>,
    profiles: RwLock<HashMap<UserId, Profile>>,
}

impl MemoryAccounts {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an account with an active session in one step.
    pub fn insert(&self, credential: impl Into<String>, user_id: UserId, profile: Profile) {
        let _ = self
            .sessions
            .write()
            .insert(credential.into(), user_id.clone());
        let _ = self.profiles.write().insert(user_id, profile);
    }

    /// Add a session without a profile (the orphaned-account case).
    pub fn insert_session(&self, credential: impl Into<String>, user_id: UserId) {
        let _ = self.sessions.write().insert(credential.into(), user_id);
    }

    /// Number of known profiles.
    #[must_use]
    pub fn profile_count(&self) -> usize {
        self.profiles.read().len()
    }
}

#[async_trait]
impl CredentialValidator for MemoryAccounts {
    async fn validate(&self, credential: &str) -> Option<UserId> {
        self.sessions.read().get(credential).cloned()
    }
}

#[async_trait]
impl ProfileDirectory for MemoryAccounts {
    async fn profile(&self, user_id: &UserId) -> Option<Profile> {
        self.profiles.read().get(user_id).cloned()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
