//! Message fan-out to every registered connection.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use parlor_core::MessageEnvelope;

use crate::connection::CloseReason;
use crate::registry::{ConnectionRegistry, RegistryEntry};

/// Builds message envelopes and fans them out over registry snapshots.
///
/// This is the only component that reads the wall clock: the envelope
/// timestamp is assigned here, when the text is accepted, giving the system
/// a single ordering authority.
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
    /// Dropped-message count at which a recipient is considered
    /// persistently saturated and evicted.
    drop_limit: u64,
}

impl Broadcaster {
    /// Create a broadcaster over the registry.
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>, drop_limit: u64) -> Self {
        Self {
            registry,
            drop_limit,
        }
    }

    /// Accept raw text from a sender and deliver it to every connection in
    /// the current registry snapshot, the sender included.
    ///
    /// Empty or whitespace-only text is dropped silently — the page refuses
    /// to send blank input, and the same rule is enforced again here as a
    /// trust boundary.
    ///
    /// Delivery to each recipient is best-effort and isolated: a full or
    /// closed outbound queue is logged, counted against that recipient, and
    /// never blocks the loop or surfaces to the sender. A recipient whose
    /// drop count passes the limit is asked to close
    /// ([`CloseReason::Backpressure`]), not waited on.
    pub fn publish(&self, sender: &RegistryEntry, raw_text: &str) {
        let text = raw_text.trim();
        if text.is_empty() {
            debug!(sender = %sender.connection.id, "dropping blank message");
            return;
        }

        let envelope = MessageEnvelope::new(&sender.identity, text, Utc::now());
        let json = match serde_json::to_string(&envelope) {
            Ok(j) => Arc::new(j),
            Err(e) => {
                warn!(sender = %sender.connection.id, error = %e, "failed to serialize envelope");
                return;
            }
        };

        let snapshot = self.registry.snapshot();
        debug!(
            sender = %sender.connection.id,
            username = %envelope.username,
            recipients = snapshot.len(),
            "broadcasting message"
        );

        for entry in &snapshot {
            if entry.connection.send(json.clone()) {
                continue;
            }
            let drops = entry.connection.drop_count();
            warn!(
                conn_id = %entry.connection.id,
                drops,
                "failed to enqueue message for recipient"
            );
            if drops >= self.drop_limit {
                warn!(
                    conn_id = %entry.connection.id,
                    drops,
                    limit = self.drop_limit,
                    "recipient persistently saturated, evicting"
                );
                entry.connection.request_close(CloseReason::Backpressure);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
