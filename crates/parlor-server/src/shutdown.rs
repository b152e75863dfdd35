//! Graceful shutdown coordination via `CancellationToken`.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::connection::CloseReason;
use crate::registry::ConnectionRegistry;

/// Default window for live sessions to drain before giving up on them.
const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Coordinates graceful shutdown: one token for the accept loop, plus a
/// bounded drain of every live session.
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Get a clone of the cancellation token.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Initiate shutdown.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Whether a shutdown has been initiated.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Perform a graceful shutdown.
    ///
    /// 1. Cancel the token (stops the accept loop)
    /// 2. Ask every registered connection to close (`ServerShutdown`)
    /// 3. Wait up to `timeout` for the registry to drain
    pub async fn graceful_shutdown(
        &self,
        registry: &Arc<ConnectionRegistry>,
        timeout: Option<Duration>,
    ) {
        let timeout = timeout.unwrap_or(DEFAULT_DRAIN_TIMEOUT);
        self.shutdown();

        let live = registry.snapshot();
        info!(connections = live.len(), "closing live connections");
        for entry in &live {
            entry.connection.request_close(CloseReason::ServerShutdown);
        }

        let drained = tokio::time::timeout(timeout, async {
            while registry.count() > 0 {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                remaining = registry.count(),
                "shutdown drain timed out after {timeout:?}"
            );
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
