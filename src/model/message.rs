//! Chat Message Data Structures
//!
//! [`Message`] is the persisted shape; [`MessageView`] is the populated form
//! that goes over the wire in `new_message` events, with sender and read-by
//! entries enriched to display summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserSummary;

/// Type of message content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Text,
    Image,
    File,
}

impl ContentType {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Image => "image",
            ContentType::File => "file",
        }
    }

    /// Parse from string (database)
    pub fn from_str(s: &str) -> Self {
        match s {
            "image" => ContentType::Image,
            "file" => ContentType::File,
            _ => ContentType::Text,
        }
    }

    /// Non-text messages must carry a file URL
    pub fn requires_file_url(&self) -> bool {
        !matches!(self, ContentType::Text)
    }
}

/// Represents a persisted chat message
///
/// Immutable once created, except for `read_by`, which grows monotonically:
/// user ids are only ever added (set semantics), never removed. The sender is
/// always in `read_by` from creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message ID
    pub id: Uuid,
    /// Conversation this message belongs to
    pub conversation_id: Uuid,
    /// User who sent the message
    pub sender: Uuid,
    pub content: String,
    #[serde(default)]
    pub content_type: ContentType,
    /// Blob-storage URL; required for image and file messages
    pub file_url: Option<String>,
    /// User ids that have read this message
    pub read_by: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A message with sender and read-by display fields populated, as broadcast
/// in `new_message` events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender: UserSummary,
    pub content: String,
    pub content_type: ContentType,
    pub file_url: Option<String>,
    pub read_by: Vec<UserSummary>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_defaults_to_text() {
        assert_eq!(ContentType::default(), ContentType::Text);
        assert_eq!(ContentType::from_str("unknown"), ContentType::Text);
    }

    #[test]
    fn test_only_text_skips_file_url() {
        assert!(!ContentType::Text.requires_file_url());
        assert!(ContentType::Image.requires_file_url());
        assert!(ContentType::File.requires_file_url());
    }

    #[test]
    fn test_message_serializes_camel_case() {
        let user = Uuid::new_v4();
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            sender: user,
            content: "hi".to_string(),
            content_type: ContentType::Text,
            file_url: None,
            read_by: vec![user],
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&message).unwrap();
        assert!(json.get("conversationId").is_some());
        assert!(json.get("contentType").is_some());
        assert!(json.get("readBy").is_some());
        assert_eq!(json["content"], "hi");
    }
}
