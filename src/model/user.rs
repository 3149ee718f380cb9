//! User Data Structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Online/offline presence status, persisted on the user record as a
/// durable projection of the in-memory presence table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Online,
    Offline,
}

impl UserStatus {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Online => "online",
            UserStatus::Offline => "offline",
        }
    }
}

/// A user account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    /// Avatar URL, if one was uploaded
    pub avatar: Option<String>,
    pub status: UserStatus,
    /// Last time this user connected or disconnected
    pub last_active: DateTime<Utc>,
}

/// Display fields of a user, embedded in populated messages
/// (sender and read-by lists carry username and avatar only).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub avatar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&UserStatus::Online).unwrap(),
            "\"online\""
        );
        assert_eq!(UserStatus::Offline.as_str(), "offline");
    }
}
