//! # parlor-auth
//!
//! Identity binding for the Parlor chat hub.
//!
//! The hub never trusts client-supplied identity fields. Every inbound
//! connection presents a session credential (a cookie value minted by the
//! external login service), and the [`IdentityBinder`] resolves it into an
//! [`parlor_core::Identity`] through two collaborator traits:
//!
//! - [`CredentialValidator`]: session credential → account ID
//! - [`ProfileDirectory`]: account ID → display name + avatar
//!
//! Binding happens exactly once per connection, before the connection is
//! admitted anywhere. An unresolvable credential is a hard rejection —
//! never a downgrade to an anonymous identity.
//!
//! [`MemoryAccounts`] implements both traits over an in-process map, with a
//! JSON seed-file loader in [`storage`] so the hub can run stand-alone.

#![deny(unsafe_code)]

pub mod binder;
pub mod errors;
pub mod memory;
pub mod storage;
pub mod traits;

pub use binder::IdentityBinder;
pub use errors::AuthError;
pub use memory::MemoryAccounts;
pub use traits::{CredentialValidator, Profile, ProfileDirectory};
