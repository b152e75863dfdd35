//! Connection registry — the single source of truth for who is currently
//! reachable.
//!
//! All mutation is serialized through one mutex so register, unregister and
//! snapshot never observe a half-updated registry. Entries keep insertion
//! (join) order; `snapshot()` returns a consistent point-in-time view for
//! broadcast iteration. The registry holds no identity-verification logic —
//! it trusts entries handed to it by the lifecycle manager.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use thiserror::Error;

use parlor_core::{ConnectionId, Identity};

use crate::connection::ChatConnection;

/// A live connection bound to its resolved identity.
#[derive(Debug)]
pub struct RegistryEntry {
    /// The connection's outbound handle.
    pub connection: Arc<ChatConnection>,
    /// Identity bound when the connection was admitted. Immutable until
    /// the connection is gone.
    pub identity: Identity,
    /// When the entry was inserted.
    pub joined_at: DateTime<Utc>,
}

/// Shared handle to a registry entry.
///
/// Cheap to clone; stays valid (as a reference to the entry's data) after
/// the entry has been removed, which makes unregistration races harmless.
pub type EntryHandle = Arc<RegistryEntry>;

/// Errors from registry mutation.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The connection already has an entry. Unreachable given lifecycle
    /// discipline; treated as a bug signal, not a user-facing error.
    #[error("connection {0} already registered")]
    AlreadyRegistered(ConnectionId),
}

/// Insertion-ordered set of live connections.
#[derive(Default)]
pub struct ConnectionRegistry {
    entries: Mutex<Vec<EntryHandle>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry for an open connection.
    ///
    /// # Errors
    ///
    /// [`RegistryError::AlreadyRegistered`] if the connection already has
    /// an entry.
    pub fn register(
        &self,
        connection: Arc<ChatConnection>,
        identity: Identity,
    ) -> Result<EntryHandle, RegistryError> {
        let mut entries = self.entries.lock();
        if entries.iter().any(|e| e.connection.id == connection.id) {
            return Err(RegistryError::AlreadyRegistered(connection.id.clone()));
        }
        let entry = Arc::new(RegistryEntry {
            connection,
            identity,
            joined_at: Utc::now(),
        });
        entries.push(entry.clone());
        Ok(entry)
    }

    /// Remove an entry. Idempotent: unregistering an already-removed handle
    /// is a no-op, which absorbs double-close races.
    pub fn unregister(&self, handle: &EntryHandle) {
        self.entries
            .lock()
            .retain(|e| e.connection.id != handle.connection.id);
    }

    /// Consistent point-in-time view of all live entries, in join order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<EntryHandle> {
        self.entries.lock().clone()
    }

    /// Number of live entries.
    #[must_use]
    pub fn count(&self) -> usize {
        self.entries.lock().len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
