//! Database operations for conversations
//!
//! The messaging core only reads conversations (membership drives
//! authorization and room joins) and touches `updated_at` when a new message
//! lands, which drives recency ordering in the conversation list views.

use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::model::{Conversation, ConversationKind};

/// Load a conversation with its participant set
pub async fn find_by_id(
    pool: &PgPool,
    conversation_id: Uuid,
) -> Result<Option<Conversation>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, name, kind, created_at, updated_at
        FROM conversations
        WHERE id = $1
        "#,
    )
    .bind(conversation_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let participants: Vec<Uuid> = sqlx::query(
        r#"
        SELECT user_id
        FROM conversation_participants
        WHERE conversation_id = $1
        ORDER BY user_id
        "#,
    )
    .bind(conversation_id)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(|r| r.get("user_id"))
    .collect();

    Ok(Some(Conversation {
        id: row.get("id"),
        name: row.get("name"),
        kind: ConversationKind::from_str(row.get::<String, _>("kind").as_str()),
        participants,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }))
}

/// Ids of every conversation the user participates in, used to auto-join
/// rooms on connect
pub async fn ids_for_participant(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT conversation_id
        FROM conversation_participants
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.get("conversation_id")).collect())
}

/// Bump a conversation's recency timestamp after a new message
pub async fn touch_updated_at(pool: &PgPool, conversation_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE conversations
        SET updated_at = $2
        WHERE id = $1
        "#,
    )
    .bind(conversation_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}
