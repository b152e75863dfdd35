//! Heartbeat liveness monitoring.
//!
//! The writer task sends the Ping frames; this watcher only reads the alive
//! flag the reader task sets on Pong, and decides when silence has gone on
//! long enough to evict the connection.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::connection::ChatConnection;

/// Outcome of the heartbeat loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatResult {
    /// The client stopped responding within the timeout window.
    TimedOut,
    /// The heartbeat was cancelled externally (connection closing).
    Cancelled,
}

/// Watch a connection's alive flag until it goes silent or the connection
/// closes.
///
/// At each `interval` tick the alive flag is checked and reset. Consecutive
/// misses accumulate; once `timeout / interval` of them (at least one) pile
/// up, the connection is considered dead and [`HeartbeatResult::TimedOut`]
/// is returned for the lifecycle task to act on.
pub async fn run_heartbeat(
    connection: Arc<ChatConnection>,
    interval: Duration,
    timeout: Duration,
    cancel: CancellationToken,
) -> HeartbeatResult {
    let mut check_interval = time::interval(interval);
    let mut missed: u32 = 0;
    let interval_secs = interval.as_secs().max(1);
    #[allow(clippy::cast_possible_truncation)]
    let max_missed = (timeout.as_secs() / interval_secs).max(1) as u32;

    loop {
        tokio::select! {
            _ = check_interval.tick() => {
                if connection.check_alive() {
                    missed = 0;
                } else {
                    missed += 1;
                    if missed >= max_missed {
                        return HeartbeatResult::TimedOut;
                    }
                }
                // Stays false until the next pong arrives
                connection.is_alive.store(false, Ordering::Relaxed);
            }
            () = cancel.cancelled() => {
                return HeartbeatResult::Cancelled;
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    use parlor_core::ConnectionId;

    fn make_connection() -> Arc<ChatConnection> {
        let (tx, _rx) = mpsc::channel(8);
        Arc::new(ChatConnection::new(ConnectionId::from("hb"), tx))
    }

    #[tokio::test]
    async fn cancelled_immediately() {
        let conn = make_connection();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = run_heartbeat(
            conn,
            Duration::from_secs(100),
            Duration::from_secs(300),
            cancel,
        )
        .await;
        assert_eq!(result, HeartbeatResult::Cancelled);
    }

    #[tokio::test]
    async fn silent_connection_times_out() {
        let conn = make_connection();
        conn.is_alive.store(false, Ordering::Relaxed);

        let result = run_heartbeat(
            conn,
            Duration::from_millis(10),
            Duration::from_millis(10),
            CancellationToken::new(),
        )
        .await;
        assert_eq!(result, HeartbeatResult::TimedOut);
    }

    #[tokio::test]
    async fn responsive_connection_survives() {
        let conn = make_connection();
        let watched = conn.clone();
        let cancel = CancellationToken::new();
        let watcher_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            run_heartbeat(
                watched,
                Duration::from_millis(50),
                Duration::from_millis(200),
                watcher_cancel,
            )
            .await
        });

        for _ in 0..5 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            conn.mark_alive();
        }

        cancel.cancel();
        assert_eq!(handle.await.unwrap(), HeartbeatResult::Cancelled);
    }

    #[tokio::test]
    async fn misses_reset_on_activity() {
        let conn = make_connection();
        let watched = conn.clone();
        let cancel = CancellationToken::new();
        let watcher_cancel = cancel.clone();

        // timeout/interval = 3 consecutive misses to die
        let handle = tokio::spawn(async move {
            run_heartbeat(
                watched,
                Duration::from_millis(200),
                Duration::from_millis(600),
                watcher_cancel,
            )
            .await
        });

        // Keep poking often enough that three misses never accumulate
        for _ in 0..5 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            conn.mark_alive();
        }

        cancel.cancel();
        assert_eq!(handle.await.unwrap(), HeartbeatResult::Cancelled);
    }

    #[tokio::test]
    async fn cancel_during_long_interval() {
        let conn = make_connection();
        let cancel = CancellationToken::new();
        let watcher_cancel = cancel.clone();

        let handle = tokio::spawn(async move {
            run_heartbeat(
                conn,
                Duration::from_secs(60),
                Duration::from_secs(180),
                watcher_cancel,
            )
            .await
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();
        assert_eq!(handle.await.unwrap(), HeartbeatResult::Cancelled);
    }
}
