//! # parlor-core
//!
//! Foundation types for the Parlor chat hub.
//!
//! This crate provides the shared vocabulary the other Parlor crates depend on:
//!
//! - **Branded IDs**: [`UserId`], [`ConnectionId`] as newtypes for type safety
//! - **Identity**: the resolved `{user_id, display_name, avatar_url}` record
//!   bound to a connection for its whole lifetime
//! - **Envelope**: the wire-level [`MessageEnvelope`] fanned out to every
//!   chat participant, plus inbound frame normalization

#![deny(unsafe_code)]

pub mod envelope;
pub mod identity;
pub mod ids;

pub use envelope::{inbound_text, MessageEnvelope};
pub use identity::Identity;
pub use ids::{ConnectionId, UserId};
