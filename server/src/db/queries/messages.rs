use sqlx::Sqlite;

use crate::db::models::MessageRow;

/// Append a message to a room's history.
pub async fn append<'e, E>(db: E, msg: &MessageRow) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO messages (id, room_id, sender_session_id, sender_name, content, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&msg.id)
    .bind(&msg.room_id)
    .bind(&msg.sender_session_id)
    .bind(&msg.sender_name)
    .bind(&msg.content)
    .bind(msg.created_at)
    .execute(db)
    .await?;
    Ok(())
}

/// List a room's messages in send order, capped at `limit`.
pub async fn list_for_room<'e, E>(
    db: E,
    room_id: &str,
    limit: i64,
) -> Result<Vec<MessageRow>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, MessageRow>(
        "SELECT * FROM messages WHERE room_id = ? ORDER BY created_at, id LIMIT ?",
    )
    .bind(room_id)
    .bind(limit)
    .fetch_all(db)
    .await
}

/// Remove all messages of a room. Part of the room teardown cascade.
pub async fn delete_for_room<'e, E>(db: E, room_id: &str) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query("DELETE FROM messages WHERE room_id = ?")
        .bind(room_id)
        .execute(db)
        .await?;
    Ok(())
}
