//! Connection lifecycle — owns a connection from acceptance through close.
//!
//! Each accepted, identity-bound socket gets one [`run_session`] task. The
//! task drives the state machine (`Connecting → Open → Closing → Closed`),
//! registers and unregisters the connection, and keeps every failure local:
//! a transport error here never touches the registry, the broadcaster, or
//! any other connection.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use parlor_core::{envelope::inbound_text, ConnectionId, Identity};

use crate::broadcast::Broadcaster;
use crate::config::ServerConfig;
use crate::connection::{ChatConnection, CloseReason};
use crate::heartbeat::{run_heartbeat, HeartbeatResult};
use crate::registry::ConnectionRegistry;

/// What the read loop should do with an inbound frame.
#[derive(Debug, PartialEq, Eq)]
enum FrameAction {
    /// Publish this (normalized) body to the room.
    Publish(String),
    /// Liveness signal only.
    KeepAlive,
    /// Drop the frame.
    Ignore,
    /// The client is done.
    Disconnect,
}

/// Classify an inbound frame.
///
/// Text and UTF-8 binary frames carry a message body (raw, or the legacy
/// `{"text": …}` shape — normalized here). Oversized and non-UTF-8 frames
/// are dropped without ending the session.
fn classify_frame(msg: &Message, max_len: usize) -> FrameAction {
    match msg {
        Message::Text(t) => {
            if t.len() > max_len {
                FrameAction::Ignore
            } else {
                FrameAction::Publish(inbound_text(t).into_owned())
            }
        }
        Message::Binary(data) => {
            if data.len() > max_len {
                return FrameAction::Ignore;
            }
            match std::str::from_utf8(data) {
                Ok(s) => FrameAction::Publish(inbound_text(s).into_owned()),
                Err(_) => FrameAction::Ignore,
            }
        }
        Message::Ping(_) | Message::Pong(_) => FrameAction::KeepAlive,
        Message::Close(_) => FrameAction::Disconnect,
    }
}

/// Run one connection's session from acceptance to its terminal state.
///
/// The caller has already bound `identity` (a bind failure never reaches
/// this function — the connection goes `Connecting → Closed` at the upgrade
/// boundary instead). Here the connection is opened, registered, pumped,
/// and — unconditionally, whatever went wrong on the way — unregistered.
#[instrument(skip_all, fields(conn_id, user_id = %identity.user_id))]
pub async fn run_session(
    ws: WebSocket,
    identity: Identity,
    registry: Arc<ConnectionRegistry>,
    broadcaster: Arc<Broadcaster>,
    config: ServerConfig,
) {
    let conn_id = ConnectionId::new();
    let _ = tracing::Span::current().record("conn_id", conn_id.as_str());

    let (send_tx, mut send_rx) = mpsc::channel::<Arc<String>>(config.send_queue_capacity);
    let connection = Arc::new(ChatConnection::new(conn_id.clone(), send_tx));
    let cancel = connection.cancel_token();

    // Connecting → Open, then admit to the registry.
    let _ = connection.open();
    let entry = match registry.register(connection.clone(), identity) {
        Ok(entry) => entry,
        Err(e) => {
            // Unreachable: a freshly generated connection ID cannot collide.
            tracing::error!(error = %e, "registry rejected connection");
            connection.finish_close();
            return;
        }
    };
    info!(display_name = %entry.identity.display_name, "client connected");

    let (mut ws_tx, mut ws_rx) = ws.split();

    // Writer: forwards the outbound queue to the socket and sends periodic
    // pings. On cancellation it flushes what is already queued, bounded by
    // the close grace period, then exits.
    let writer_cancel = cancel.clone();
    let grace = config.close_grace();
    let ping_interval = config.heartbeat_interval();
    let writer = tokio::spawn(async move {
        let mut ping = tokio::time::interval(ping_interval);
        // Skip the immediate first tick
        let _ = ping.tick().await;

        loop {
            tokio::select! {
                msg = send_rx.recv() => {
                    match msg {
                        Some(text) => {
                            if ws_tx.send(Message::Text((*text).clone().into())).await.is_err() {
                                return;
                            }
                        }
                        None => return,
                    }
                }
                _ = ping.tick() => {
                    if ws_tx.send(Message::Ping(vec![].into())).await.is_err() {
                        return;
                    }
                }
                () = writer_cancel.cancelled() => break,
            }
        }

        // Closing: flush outstanding sends, abandon the rest at the deadline.
        let deadline = tokio::time::Instant::now() + grace;
        while let Ok(text) = send_rx.try_recv() {
            let send = ws_tx.send(Message::Text((*text).clone().into()));
            match tokio::time::timeout_at(deadline, send).await {
                Ok(Ok(())) => {}
                _ => break,
            }
        }
        let _ = ws_tx.close().await;
    });

    // Heartbeat watcher: the writer pings, the reader marks pongs, this
    // task turns sustained silence into an eviction request.
    let hb_connection = connection.clone();
    let hb_cancel = cancel.clone();
    let hb_interval = config.heartbeat_interval();
    let hb_timeout = config.heartbeat_timeout();
    let heartbeat = tokio::spawn(async move {
        let result =
            run_heartbeat(hb_connection.clone(), hb_interval, hb_timeout, hb_cancel).await;
        if result == HeartbeatResult::TimedOut {
            warn!(conn_id = %hb_connection.id, "client unresponsive, disconnecting");
            hb_connection.request_close(CloseReason::Unresponsive);
        }
    });

    // Read loop. Every exit path funnels into the cleanup below.
    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                // Evicted (backpressure, heartbeat) or server shutdown.
                let reason = connection
                    .close_reason()
                    .unwrap_or(CloseReason::ServerShutdown);
                let _ = connection.begin_close(reason);
                break;
            }
            frame = ws_rx.next() => {
                match frame {
                    None => {
                        let _ = connection.begin_close(CloseReason::ClientClosed);
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "transport error");
                        let _ = connection.begin_close(CloseReason::TransportError);
                        break;
                    }
                    Some(Ok(msg)) => match classify_frame(&msg, config.max_message_size) {
                        FrameAction::Publish(body) => {
                            connection.mark_alive();
                            broadcaster.publish(&entry, &body);
                        }
                        FrameAction::KeepAlive => connection.mark_alive(),
                        FrameAction::Ignore => {
                            debug!("ignoring oversized or non-UTF-8 frame");
                        }
                        FrameAction::Disconnect => {
                            let _ = connection.begin_close(CloseReason::ClientClosed);
                            break;
                        }
                    },
                }
            }
        }
    }

    // Cleanup. Runs on every path out of the loop; the transition to
    // Closed and the unregister are unconditional so the registry can
    // never retain a stale entry.
    cancel.cancel();
    let _ = writer.await;
    let _ = heartbeat.await;
    connection.finish_close();
    registry.unregister(&entry);
    let reason = connection
        .close_reason()
        .unwrap_or(CloseReason::ClientClosed);
    info!(
        reason = %reason,
        age_secs = connection.age().as_secs(),
        dropped = connection.drop_count(),
        "client disconnected"
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    // Full sessions need a live WebSocket and are covered by
    // tests/integration.rs; these cover the frame classification the read
    // loop runs on.

    use super::*;

    #[test]
    fn text_frame_published() {
        let action = classify_frame(&Message::Text("hello".into()), 1024);
        assert_eq!(action, FrameAction::Publish("hello".into()));
    }

    #[test]
    fn legacy_json_frame_unwrapped() {
        let action = classify_frame(&Message::Text(r#"{"text":"hello"}"#.into()), 1024);
        assert_eq!(action, FrameAction::Publish("hello".into()));
    }

    #[test]
    fn utf8_binary_frame_published() {
        let action = classify_frame(&Message::Binary(b"hello".to_vec().into()), 1024);
        assert_eq!(action, FrameAction::Publish("hello".into()));
    }

    #[test]
    fn non_utf8_binary_ignored() {
        let action = classify_frame(&Message::Binary(vec![0xff, 0xfe].into()), 1024);
        assert_eq!(action, FrameAction::Ignore);
    }

    #[test]
    fn oversized_text_ignored() {
        let action = classify_frame(&Message::Text("hello".into()), 3);
        assert_eq!(action, FrameAction::Ignore);
    }

    #[test]
    fn oversized_binary_ignored() {
        let action = classify_frame(&Message::Binary(vec![b'a'; 10].into()), 3);
        assert_eq!(action, FrameAction::Ignore);
    }

    #[test]
    fn ping_pong_keep_alive() {
        assert_eq!(
            classify_frame(&Message::Ping(vec![].into()), 1024),
            FrameAction::KeepAlive
        );
        assert_eq!(
            classify_frame(&Message::Pong(vec![].into()), 1024),
            FrameAction::KeepAlive
        );
    }

    #[test]
    fn close_frame_disconnects() {
        assert_eq!(
            classify_frame(&Message::Close(None), 1024),
            FrameAction::Disconnect
        );
    }
}
