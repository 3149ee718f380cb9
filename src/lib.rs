//! Ripplechat backend library
//!
//! A realtime chat backend: a WebSocket messaging core over a PostgreSQL
//! store. The interesting part lives in [`realtime`]: connection lifecycle,
//! room-based fan-out, presence tracking and the read/typing/delivery event
//! protocol. Everything else (auth tokens, models, stores, server wiring) is
//! the plumbing that feeds it.

pub mod auth;
pub mod error;
pub mod model;
pub mod realtime;
pub mod server;
pub mod store;
