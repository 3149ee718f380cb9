//! Persistence collaborators
//!
//! Thin sqlx read/write operations the messaging core needs: load a
//! conversation and its participants, persist a message, grow read-receipt
//! sets, project presence onto the user record. No query mechanics beyond
//! that live here; richer CRUD belongs to the HTTP API, not the socket core.

pub mod conversations;
pub mod messages;
pub mod users;
