//! Database operations for users
//!
//! The socket layer only projects presence onto the user record and reads
//! display summaries for message population.

use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::model::{UserStatus, UserSummary};

/// Persist a user's presence status and bump `last_active`.
///
/// Best-effort from the caller's perspective: connection lifecycle treats a
/// failure here as a log line, never as a fatal error.
pub async fn set_status(
    pool: &PgPool,
    user_id: Uuid,
    status: UserStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE users
        SET status = $2, last_active = $3
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(status.as_str())
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

/// Display summaries (username, avatar) for a set of user ids
pub async fn summaries(pool: &PgPool, user_ids: &[Uuid]) -> Result<Vec<UserSummary>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, username, avatar
        FROM users
        WHERE id = ANY($1)
        "#,
    )
    .bind(user_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| UserSummary {
            id: row.get("id"),
            username: row.get("username"),
            avatar: row.get("avatar"),
        })
        .collect())
}
