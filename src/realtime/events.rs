/**
 * Socket Wire Protocol
 *
 * Frames are JSON text with an `{ "event": <tag>, "data": <payload> }`
 * envelope in both directions, expressed here as adjacently tagged serde
 * enums. There are five client event kinds and five server event kinds;
 * anything else on the wire is a validation error, not a crash.
 *
 * Field names are camelCase to match the deployed chat clients.
 */

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ErrorKind, SocketError};
use crate::model::{ContentType, MessageView, UserStatus};

/// Events a client may send over its socket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    SendMessage(SendMessagePayload),
    Typing(TypingPayload),
    MarkRead(ConversationRef),
    JoinConversation(ConversationRef),
    LeaveConversation(ConversationRef),
}

/// Payload of a `send_message` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessagePayload {
    pub conversation_id: Uuid,
    pub content: String,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default)]
    pub file_url: Option<String>,
}

/// Payload of a client `typing` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub conversation_id: Uuid,
    pub is_typing: bool,
}

/// Payload naming a conversation (`mark_read`, `join_conversation`,
/// `leave_conversation`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRef {
    pub conversation_id: Uuid,
}

/// Events the server pushes to connected clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// A new message, fully populated, broadcast to its conversation room
    NewMessage(MessageView),
    /// Typing state change, broadcast to the room excluding the typist
    Typing(TypingBroadcast),
    /// Read-receipt delta for a conversation
    MessagesRead(MessagesReadBroadcast),
    /// Global presence announcement, broadcast to every connection
    UserStatusChanged(UserStatusBroadcast),
    /// One failure, one event; the connection stays open
    Error(ErrorEvent),
}

/// Server-side `typing` broadcast payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingBroadcast {
    pub user_id: Uuid,
    pub conversation_id: Uuid,
    pub is_typing: bool,
}

/// `messages_read` broadcast payload
///
/// `message_ids` carries every message id in the conversation currently read
/// by `user_id`, not just the ids this call flipped. Consumers treat it as
/// the authoritative read set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesReadBroadcast {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub message_ids: Vec<Uuid>,
}

/// `user_status_changed` broadcast payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusBroadcast {
    pub user_id: Uuid,
    pub status: UserStatus,
}

/// `error` event payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub message: String,
    pub kind: ErrorKind,
}

impl ServerEvent {
    /// Build the single `error` event for a failed operation
    pub fn error(err: &SocketError) -> Self {
        ServerEvent::Error(ErrorEvent {
            message: err.client_message(),
            kind: err.kind(),
        })
    }
}
