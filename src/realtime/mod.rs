//! The Realtime Messaging Core
//!
//! Everything that keeps live socket connections useful:
//!
//! - **`events`** - the bidirectional wire protocol (tagged JSON frames)
//! - **`presence`** - the process-wide user-to-connection table
//! - **`rooms`** - the room router: one broadcast group per conversation
//! - **`handlers`** - message relay, read receipts, typing, join/leave
//! - **`socket`** - WebSocket upgrade, handshake auth, dispatch loop
//!
//! # Concurrency model
//!
//! Presence and room membership are the only shared mutable state in the
//! process. Both are concurrency-safe keyed maps whose operations are
//! synchronous and never suspend; every persistence call is an await point
//! where other connections' handlers may interleave. Within one connection,
//! frames are handled strictly one at a time.
//!
//! # Ordering
//!
//! Room broadcasts are delivered in persist-completion order, which can
//! differ from arrival order when storage latencies vary. That weak ordering
//! is accepted; insertion timestamps are the only ordering the data model
//! guarantees.

pub mod events;
pub mod handlers;
pub mod presence;
pub mod rooms;
pub mod socket;

pub use events::{ClientEvent, ServerEvent};
pub use presence::PresenceTable;
pub use rooms::{ConnectionHandle, ConnectionId, RoomRouter};
pub use socket::ws_handler;
