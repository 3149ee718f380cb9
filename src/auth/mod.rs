//! Connection authentication
//!
//! Socket handshakes carry a bearer JWT; [`sessions`] creates and verifies
//! those tokens and resolves them to a user identity before any room join
//! occurs.

pub mod sessions;

pub use sessions::{authenticate, create_token, verify_token, Claims};
