//! Auth error types.

use parlor_core::UserId;
use thiserror::Error;

/// Errors that can occur while binding a connection to an identity.
///
/// Every variant means the same thing to the connecting client —
/// unauthenticated, connection rejected — but the variants keep the server
/// log lines distinct (missing cookie vs. stale cookie vs. orphaned
/// account).
#[derive(Debug, Error)]
pub enum AuthError {
    /// No session credential was presented with the connection.
    #[error("no session credential presented")]
    MissingCredential,

    /// The presented credential does not resolve to any account.
    #[error("session credential not recognized")]
    InvalidCredential,

    /// The credential resolved to an account the profile directory does not
    /// know — a half-deleted account or a directory outage.
    #[error("no profile for user {0}")]
    UnknownUser(UserId),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_display() {
        assert_eq!(
            AuthError::MissingCredential.to_string(),
            "no session credential presented"
        );
    }

    #[test]
    fn invalid_credential_display() {
        assert_eq!(
            AuthError::InvalidCredential.to_string(),
            "session credential not recognized"
        );
    }

    #[test]
    fn unknown_user_names_the_user() {
        let err = AuthError::UnknownUser(UserId::from("u9"));
        assert_eq!(err.to_string(), "no profile for user u9");
    }
}
