//! Error handling for the messaging core
//!
//! All handler-level failures are caught locally and surfaced to the client
//! as a single `error` event; only authentication failures terminate the
//! connection itself. See [`types::SocketError`] for the taxonomy.

pub mod types;

pub use types::{ErrorKind, SocketError};
