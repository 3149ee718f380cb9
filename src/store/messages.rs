//! Database operations for messages and read-receipts
//!
//! The `message_reads` table is the `readBy` set: one row per
//! (message, reader), so set semantics and idempotence come from the primary
//! key rather than application logic.

use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::model::{ContentType, Message, MessageView, UserSummary};
use crate::store::users;

/// Persist a new message.
///
/// The sender's read row is inserted in the same transaction: a message is
/// always read by its own author from the moment it exists.
pub async fn create(
    pool: &PgPool,
    conversation_id: Uuid,
    sender_id: Uuid,
    content: &str,
    content_type: ContentType,
    file_url: Option<&str>,
) -> Result<Message, sqlx::Error> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO messages (id, conversation_id, sender_id, content, content_type, file_url, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(id)
    .bind(conversation_id)
    .bind(sender_id)
    .bind(content)
    .bind(content_type.as_str())
    .bind(file_url)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO message_reads (message_id, user_id, read_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(id)
    .bind(sender_id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Message {
        id,
        conversation_id,
        sender: sender_id,
        content: content.to_string(),
        content_type,
        file_url: file_url.map(|s| s.to_string()),
        read_by: vec![sender_id],
        created_at: now,
    })
}

/// Mark every message in the conversation not sent by `reader_id` and not
/// yet read by them as read.
///
/// Set-union semantics: `ON CONFLICT DO NOTHING` makes repeated calls
/// idempotent. Returns the number of newly flipped messages.
pub async fn mark_unread_as_read(
    pool: &PgPool,
    conversation_id: Uuid,
    reader_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO message_reads (message_id, user_id, read_at)
        SELECT m.id, $2, $3
        FROM messages m
        WHERE m.conversation_id = $1 AND m.sender_id <> $2
        ON CONFLICT (message_id, user_id) DO NOTHING
        "#,
    )
    .bind(conversation_id)
    .bind(reader_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// All message ids in the conversation currently read by the user.
///
/// Deliberately broader than the delta of the last mark-read call; the
/// `messages_read` broadcast carries the full read set.
pub async fn read_message_ids(
    pool: &PgPool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT m.id
        FROM messages m
        JOIN message_reads r ON r.message_id = m.id
        WHERE m.conversation_id = $1 AND r.user_id = $2
        ORDER BY m.created_at
        "#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.get("id")).collect())
}

/// Enrich a message with sender and read-by display fields for broadcast
pub async fn populate(pool: &PgPool, message: &Message) -> Result<MessageView, sqlx::Error> {
    let mut wanted: Vec<Uuid> = message.read_by.clone();
    if !wanted.contains(&message.sender) {
        wanted.push(message.sender);
    }

    let summaries = users::summaries(pool, &wanted).await?;

    let find = |id: Uuid| -> Option<UserSummary> {
        summaries.iter().find(|s| s.id == id).cloned()
    };

    let sender = find(message.sender).ok_or(sqlx::Error::RowNotFound)?;
    let read_by = message.read_by.iter().filter_map(|&id| find(id)).collect();

    Ok(MessageView {
        id: message.id,
        conversation_id: message.conversation_id,
        sender,
        content: message.content.clone(),
        content_type: message.content_type,
        file_url: message.file_url.clone(),
        read_by,
        created_at: message.created_at,
    })
}
