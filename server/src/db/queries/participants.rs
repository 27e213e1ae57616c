use chrono::{DateTime, Utc};
use sqlx::Sqlite;

use crate::db::models::ParticipantRow;

/// List a room's participants, oldest join first.
pub async fn list_for_room<'e, E>(
    db: E,
    room_id: &str,
) -> Result<Vec<ParticipantRow>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ParticipantRow>(
        "SELECT * FROM participants WHERE room_id = ? ORDER BY joined_at, session_id",
    )
    .bind(room_id)
    .fetch_all(db)
    .await
}

/// Insert a participant row.
pub async fn insert<'e, E>(db: E, p: &ParticipantRow) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO participants (room_id, session_id, user_name, role, joined_at, last_heartbeat_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&p.room_id)
    .bind(&p.session_id)
    .bind(&p.user_name)
    .bind(p.role)
    .bind(p.joined_at)
    .bind(p.last_heartbeat_at)
    .execute(db)
    .await?;
    Ok(())
}

/// Remove all participants of a room.
pub async fn delete_for_room<'e, E>(db: E, room_id: &str) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query("DELETE FROM participants WHERE room_id = ?")
        .bind(room_id)
        .execute(db)
        .await?;
    Ok(())
}

/// Refresh a participant's heartbeat timestamp. Returns false when the
/// session is not currently a member — late heartbeats after a departure
/// must not recreate the row.
pub async fn touch_heartbeat<'e, E>(
    db: E,
    room_id: &str,
    session_id: &str,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE participants SET last_heartbeat_at = ? WHERE room_id = ? AND session_id = ?",
    )
    .bind(now)
    .bind(room_id)
    .bind(session_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}
