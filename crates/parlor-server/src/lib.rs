//! # parlor-server
//!
//! Axum HTTP + `WebSocket` server for the Parlor chat hub.
//!
//! - **Connection Registry**: single source of truth for who is reachable,
//!   one critical section, insertion-ordered snapshots
//! - **Message Broadcaster**: envelope construction (the one place
//!   wall-clock time enters the system) and isolated best-effort fan-out
//! - **Connection Lifecycle Manager**: per-connection state machine from
//!   accept through close, heartbeat liveness, bounded close grace
//! - HTTP surface: cookie-authenticated `/ws` upgrade, `/health`
//! - Graceful shutdown via `tokio::signal` + `CancellationToken`

#![deny(unsafe_code)]

pub mod broadcast;
pub mod config;
pub mod connection;
pub mod health;
pub mod heartbeat;
pub mod lifecycle;
pub mod registry;
pub mod server;
pub mod shutdown;
