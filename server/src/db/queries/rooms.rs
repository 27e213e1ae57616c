use chrono::Utc;
use sqlx::Sqlite;

use crate::db::models::{CreateRoomParams, RoomRow, RoomStatus, RoomSummaryRow};

/// Insert a new room in `waiting` status. Returns the stored row.
pub async fn insert_room<'e, E>(
    db: E,
    params: &CreateRoomParams<'_>,
) -> Result<RoomRow, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let created_at = Utc::now();
    sqlx::query(
        "INSERT INTO rooms (id, topic, title, description, status, max_debaters, \
         enable_spectators, duration_secs, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(params.id)
    .bind(params.topic)
    .bind(params.title)
    .bind(params.description)
    .bind(RoomStatus::Waiting)
    .bind(params.max_debaters)
    .bind(params.enable_spectators)
    .bind(params.duration_secs)
    .bind(created_at)
    .execute(db)
    .await?;

    Ok(RoomRow {
        id: params.id.to_string(),
        topic: params.topic.to_string(),
        title: params.title.to_string(),
        description: params.description.to_string(),
        status: RoomStatus::Waiting,
        max_debaters: params.max_debaters,
        enable_spectators: params.enable_spectators,
        duration_secs: params.duration_secs,
        created_at,
    })
}

/// Get a room by ID.
pub async fn get_room<'e, E>(db: E, room_id: &str) -> Result<Option<RoomRow>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, RoomRow>("SELECT * FROM rooms WHERE id = ?")
        .bind(room_id)
        .fetch_optional(db)
        .await
}

/// Issue a no-op write against a room row. This is the first statement of
/// every room mutation: it takes SQLite's write lock for the transaction so
/// concurrent read-modify-write cycles on the same database serialize, and
/// its affected-row count doubles as the existence check.
pub async fn touch_room<'e, E>(db: E, room_id: &str) -> Result<bool, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE rooms SET status = status WHERE id = ?")
        .bind(room_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Update a room's status.
pub async fn set_status<'e, E>(
    db: E,
    room_id: &str,
    status: RoomStatus,
) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE rooms SET status = ? WHERE id = ?")
        .bind(status)
        .bind(room_id)
        .execute(db)
        .await?;
    Ok(())
}

/// Delete a room row.
pub async fn delete_room<'e, E>(db: E, room_id: &str) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query("DELETE FROM rooms WHERE id = ?")
        .bind(room_id)
        .execute(db)
        .await?;
    Ok(())
}

/// List all rooms with their participant counts, newest first.
pub async fn list_summaries<'e, E>(db: E) -> Result<Vec<RoomSummaryRow>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, RoomSummaryRow>(
        "SELECT r.id, r.topic, r.title, r.status, r.max_debaters, r.enable_spectators, \
         r.created_at, COUNT(p.session_id) AS participant_count \
         FROM rooms r \
         LEFT JOIN participants p ON p.room_id = r.id \
         GROUP BY r.id \
         ORDER BY r.created_at DESC",
    )
    .fetch_all(db)
    .await
}

/// List all room IDs. Used by the reaper to iterate rooms independently.
pub async fn list_room_ids<'e, E>(db: E) -> Result<Vec<String>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar("SELECT id FROM rooms ORDER BY created_at")
        .fetch_all(db)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::{create_pool, run_migrations};
    use sqlx::SqlitePool;

    async fn setup_db() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    fn params<'a>(id: &'a str, topic: &'a str) -> CreateRoomParams<'a> {
        CreateRoomParams {
            id,
            topic,
            title: "Test debate",
            description: "",
            max_debaters: 2,
            enable_spectators: true,
            duration_secs: 1800,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_room() {
        let pool = setup_db().await;
        insert_room(&pool, &params("r1", "Pineapple on pizza"))
            .await
            .unwrap();

        let room = get_room(&pool, "r1").await.unwrap().unwrap();
        assert_eq!(room.topic, "Pineapple on pizza");
        assert_eq!(room.status, RoomStatus::Waiting);
        assert_eq!(room.max_debaters, 2);
        assert!(room.enable_spectators);
    }

    #[tokio::test]
    async fn test_get_nonexistent_room() {
        let pool = setup_db().await;
        assert!(get_room(&pool, "nosuch").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_touch_room_reports_existence() {
        let pool = setup_db().await;
        insert_room(&pool, &params("r1", "t")).await.unwrap();

        assert!(touch_room(&pool, "r1").await.unwrap());
        assert!(!touch_room(&pool, "nosuch").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_status() {
        let pool = setup_db().await;
        insert_room(&pool, &params("r1", "t")).await.unwrap();

        set_status(&pool, "r1", RoomStatus::Active).await.unwrap();
        let room = get_room(&pool, "r1").await.unwrap().unwrap();
        assert_eq!(room.status, RoomStatus::Active);
    }

    #[tokio::test]
    async fn test_delete_room() {
        let pool = setup_db().await;
        insert_room(&pool, &params("r1", "t")).await.unwrap();

        delete_room(&pool, "r1").await.unwrap();
        assert!(get_room(&pool, "r1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_summaries_counts_participants() {
        let pool = setup_db().await;
        insert_room(&pool, &params("r1", "t1")).await.unwrap();
        insert_room(&pool, &params("r2", "t2")).await.unwrap();

        sqlx::query(
            "INSERT INTO participants (room_id, session_id, user_name, role, joined_at, last_heartbeat_at) \
             VALUES ('r1', 's1', 'Alice', 'pro', datetime('now'), datetime('now'))",
        )
        .execute(&pool)
        .await
        .unwrap();

        let summaries = list_summaries(&pool).await.unwrap();
        assert_eq!(summaries.len(), 2);
        let r1 = summaries.iter().find(|s| s.id == "r1").unwrap();
        let r2 = summaries.iter().find(|s| s.id == "r2").unwrap();
        assert_eq!(r1.participant_count, 1);
        assert_eq!(r2.participant_count, 0);
    }

    #[tokio::test]
    async fn test_list_room_ids() {
        let pool = setup_db().await;
        insert_room(&pool, &params("r1", "t1")).await.unwrap();
        insert_room(&pool, &params("r2", "t2")).await.unwrap();

        let ids = list_room_ids(&pool).await.unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"r1".to_string()));
        assert!(ids.contains(&"r2".to_string()));
    }
}
