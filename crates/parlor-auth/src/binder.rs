//! Identity binder — resolves a connection's session credential into an
//! [`Identity`] before the connection is admitted anywhere.

use std::sync::Arc;

use tracing::{debug, warn};

use parlor_core::Identity;

use crate::errors::AuthError;
use crate::traits::{CredentialValidator, ProfileDirectory};

/// Translates a session credential into a bound [`Identity`].
///
/// Stateless beyond the two collaborator handles. Called exactly once per
/// connection; there are no retries — a failed bind closes the connection
/// with a protocol-level rejection.
pub struct IdentityBinder {
    validator: Arc<dyn CredentialValidator>,
    profiles: Arc<dyn ProfileDirectory>,
}

impl IdentityBinder {
    /// Create a binder over the two external collaborators.
    pub fn new(validator: Arc<dyn CredentialValidator>, profiles: Arc<dyn ProfileDirectory>) -> Self {
        Self {
            validator,
            profiles,
        }
    }

    /// Resolve a credential (if one was presented) into an identity.
    ///
    /// # Errors
    ///
    /// Every error is an unauthenticated rejection: the credential was
    /// absent, unknown to the validator, or resolved to an account the
    /// profile directory cannot find.
    pub async fn bind(&self, credential: Option<&str>) -> Result<Identity, AuthError> {
        let credential = credential.ok_or(AuthError::MissingCredential)?;

        let Some(user_id) = self.validator.validate(credential).await else {
            warn!("rejected connection: credential not recognized");
            return Err(AuthError::InvalidCredential);
        };

        let Some(profile) = self.profiles.profile(&user_id).await else {
            warn!(user_id = %user_id, "rejected connection: no profile for account");
            return Err(AuthError::UnknownUser(user_id));
        };

        debug!(user_id = %user_id, display_name = %profile.display_name, "identity bound");
        let mut identity = Identity::new(user_id, profile.display_name);
        identity.avatar_url = profile.avatar_url;
        Ok(identity)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
