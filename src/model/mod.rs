//! Domain Data Structures
//!
//! Conversations, messages and users as the messaging core sees them.
//! Everything here serializes with camelCase field names, matching the wire
//! protocol the chat clients already speak.

pub mod conversation;
pub mod message;
pub mod user;

pub use conversation::{Conversation, ConversationKind};
pub use message::{ContentType, Message, MessageView};
pub use user::{User, UserStatus, UserSummary};
