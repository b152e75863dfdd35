//! Per-connection state: outbound channel, liveness flags, and the
//! `Connecting → Open → Closing → Closed` state machine.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use parlor_core::ConnectionId;

/// Lifecycle states of a chat connection.
///
/// Only the lifecycle manager writes transitions; every other component
/// reads at most.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// Accepted at the transport, identity not yet bound.
    Connecting,
    /// Bound and registered; reachable by broadcasts.
    Open,
    /// Close initiated; queued sends are being flushed or abandoned.
    Closing,
    /// Terminal. The registry entry is gone.
    Closed,
}

/// Why a connection left (or is leaving) the `Open` state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseReason {
    /// The client sent a close frame or dropped the socket.
    ClientClosed,
    /// Unrecoverable transport error on this connection.
    TransportError,
    /// Outbound queue stayed saturated past the drop limit.
    Backpressure,
    /// Missed heartbeats past the timeout window.
    Unresponsive,
    /// The server is shutting down.
    ServerShutdown,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ClientClosed => "client closed",
            Self::TransportError => "transport error",
            Self::Backpressure => "backpressure",
            Self::Unresponsive => "unresponsive",
            Self::ServerShutdown => "server shutdown",
        };
        f.write_str(s)
    }
}

/// A live chat connection.
///
/// Owns the sending half of the connection's outbound queue; a dedicated
/// writer task on the other end forwards to the actual socket, so fan-out
/// never waits on transport latency.
#[derive(Debug)]
pub struct ChatConnection {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// Send half of the outbound queue.
    tx: mpsc::Sender<Arc<String>>,
    /// Current lifecycle state. Written only by the lifecycle manager.
    state: Mutex<ConnectionState>,
    /// Close reason requested by another component (broadcaster eviction,
    /// heartbeat timeout, shutdown). The lifecycle task picks it up when it
    /// observes the cancellation.
    requested_close: Mutex<Option<CloseReason>>,
    /// When this connection was established.
    pub connected_at: Instant,
    /// Whether the client has responded since the last heartbeat check.
    pub is_alive: AtomicBool,
    /// When the last Pong (or any activity) was received.
    last_pong: Mutex<Instant>,
    /// Count of messages dropped due to a full queue.
    dropped_messages: AtomicU64,
    /// Cancelled to tear this connection down, and only this one.
    cancel: CancellationToken,
}

impl ChatConnection {
    /// Create a connection in the `Connecting` state.
    #[must_use]
    pub fn new(id: ConnectionId, tx: mpsc::Sender<Arc<String>>) -> Self {
        let now = Instant::now();
        Self {
            id,
            tx,
            state: Mutex::new(ConnectionState::Connecting),
            requested_close: Mutex::new(None),
            connected_at: now,
            is_alive: AtomicBool::new(true),
            last_pong: Mutex::new(now),
            dropped_messages: AtomicU64::new(0),
            cancel: CancellationToken::new(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// `Connecting → Open`. Returns `false` (and leaves state alone) from
    /// any other state.
    pub fn open(&self) -> bool {
        let mut state = self.state.lock();
        if *state == ConnectionState::Connecting {
            *state = ConnectionState::Open;
            true
        } else {
            false
        }
    }

    /// `Connecting | Open → Closing`. Returns `false` if a close was
    /// already underway (the first reason wins).
    pub fn begin_close(&self, reason: CloseReason) -> bool {
        let mut state = self.state.lock();
        match *state {
            ConnectionState::Connecting | ConnectionState::Open => {
                *state = ConnectionState::Closing;
                let mut requested = self.requested_close.lock();
                if requested.is_none() {
                    *requested = Some(reason);
                }
                true
            }
            ConnectionState::Closing | ConnectionState::Closed => false,
        }
    }

    /// `→ Closed`. Unconditional and terminal; safe to call from any state
    /// and any number of times.
    pub fn finish_close(&self) {
        *self.state.lock() = ConnectionState::Closed;
    }

    /// The reason recorded for this connection's close, if any yet.
    pub fn close_reason(&self) -> Option<CloseReason> {
        *self.requested_close.lock()
    }

    /// Ask the lifecycle task to close this connection.
    ///
    /// Used by components that must never block on a peer: the broadcaster
    /// on persistent backpressure, the heartbeat on silence, the shutdown
    /// coordinator. Records the reason (first one wins) and fires the
    /// cancellation token; the lifecycle task performs the actual
    /// transition.
    pub fn request_close(&self, reason: CloseReason) {
        let mut requested = self.requested_close.lock();
        if requested.is_none() {
            *requested = Some(reason);
        }
        drop(requested);
        self.cancel.cancel();
    }

    /// Token cancelled when this connection should tear down.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Enqueue a text message for delivery to the client.
    ///
    /// Returns `false` if the queue is full or closed, and increments the
    /// dropped-message counter.
    pub fn send(&self, message: Arc<String>) -> bool {
        if self.tx.try_send(message).is_ok() {
            true
        } else {
            let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Total messages dropped for this connection.
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// Messages currently waiting in the outbound queue.
    pub fn outbound_queue_depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Mark the connection as alive (pong or any inbound activity).
    pub fn mark_alive(&self) {
        self.is_alive.store(true, Ordering::Relaxed);
        *self.last_pong.lock() = Instant::now();
    }

    /// Check and reset the alive flag for heartbeat monitoring.
    ///
    /// Returns `true` if the connection was alive since the last check.
    pub fn check_alive(&self) -> bool {
        self.is_alive.swap(false, Ordering::Relaxed)
    }

    /// Duration since the last pong (or connection establishment).
    pub fn last_pong_elapsed(&self) -> Duration {
        self.last_pong.lock().elapsed()
    }

    /// Connection age.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
