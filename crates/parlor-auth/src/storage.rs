//! Seed-file I/O for the in-memory account store.
//!
//! Lets a stand-alone hub load its accounts from a JSON file at boot:
//!
//! ```json
//! [
//!   {
//!     "session": "dev-ann",
//!     "user_id": "u1",
//!     "display_name": "Ann",
//!     "avatar_url": "/uploads/ann.png"
//!   }
//! ]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use parlor_core::UserId;

use crate::memory::MemoryAccounts;
use crate::traits::Profile;

/// One account entry in the seed file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SeedAccount {
    /// Session credential the account's cookie will carry.
    pub session: String,
    /// Stable account ID.
    pub user_id: String,
    /// Name shown next to chat messages.
    pub display_name: String,
    /// Avatar URL, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// Load a seed file into a fresh [`MemoryAccounts`].
///
/// Returns `None` (with a warning) when the file is missing or malformed —
/// the hub then starts with an empty store rather than refusing to boot.
pub fn load_accounts(path: &Path) -> Option<MemoryAccounts> {
    let data = match std::fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "accounts seed file not found");
            return None;
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), "failed to read accounts seed file: {e}");
            return None;
        }
    };

    let seeds: Vec<SeedAccount> = match serde_json::from_str(&data) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(path = %path.display(), "failed to parse accounts seed file: {e}");
            return None;
        }
    };

    let accounts = MemoryAccounts::new();
    for seed in seeds {
        accounts.insert(
            seed.session,
            UserId::from(seed.user_id),
            Profile {
                display_name: seed.display_name,
                avatar_url: seed.avatar_url,
            },
        );
    }
    tracing::info!(path = %path.display(), count = accounts.profile_count(), "accounts loaded");
    Some(accounts)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::CredentialValidator;

    fn write_seed(content: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), content).unwrap();
        file
    }

    #[tokio::test]
    async fn loads_accounts_from_file() {
        let file = write_seed(
            r#"[
                {"session":"dev-ann","user_id":"u1","display_name":"Ann","avatar_url":"/a.png"},
                {"session":"dev-bo","user_id":"u2","display_name":"Bo"}
            ]"#,
        );
        let accounts = load_accounts(file.path()).unwrap();
        assert_eq!(accounts.profile_count(), 2);
        assert_eq!(
            accounts.validate("dev-ann").await,
            Some(UserId::from("u1"))
        );
    }

    #[test]
    fn missing_file_is_none() {
        assert!(load_accounts(Path::new("/nonexistent/accounts.json")).is_none());
    }

    #[test]
    fn malformed_json_is_none() {
        let file = write_seed("{not json");
        assert!(load_accounts(file.path()).is_none());
    }

    #[test]
    fn empty_list_is_empty_store() {
        let file = write_seed("[]");
        let accounts = load_accounts(file.path()).unwrap();
        assert_eq!(accounts.profile_count(), 0);
    }

    #[test]
    fn seed_account_serde_roundtrip() {
        let seed = SeedAccount {
            session: "s".into(),
            user_id: "u".into(),
            display_name: "D".into(),
            avatar_url: None,
        };
        let json = serde_json::to_string(&seed).unwrap();
        assert!(!json.contains("avatar_url"));
        let back: SeedAccount = serde_json::from_str(&json).unwrap();
        assert_eq!(back.session, "s");
    }
}
