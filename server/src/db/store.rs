use sqlx::SqlitePool;
use tracing::debug;

use crate::db::models::{
    CreateRoomParams, MessageRow, RoomRow, RoomSnapshot, RoomSummaryRow,
};
use crate::db::queries::{messages, participants, rooms};
use crate::error::AppError;

/// Write-retry budget for a conflicting room mutation before the caller
/// sees `AppError::Conflict`.
const WRITE_ATTEMPTS: u32 = 5;
const RETRY_BACKOFF_MS: u64 = 25;

/// What a room mutation wants persisted.
pub enum RoomWrite {
    /// Replace the room's snapshot (participants + status).
    Put(RoomSnapshot),
    /// Tear the room down: messages, participants and the room row go
    /// together, in this transaction.
    Delete,
}

/// Durable keyed storage of rooms, participants and messages. All room
/// mutations go through [`RoomStore::with_room`], the transactional
/// read-modify-write that serializes concurrent writers.
#[derive(Clone)]
pub struct RoomStore {
    pool: SqlitePool,
}

impl RoomStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a new room.
    pub async fn create_room(&self, params: &CreateRoomParams<'_>) -> Result<RoomRow, AppError> {
        Ok(rooms::insert_room(&self.pool, params).await?)
    }

    /// Read a consistent snapshot of one room. Room row and participant list
    /// come from a single read transaction, so a concurrent teardown can
    /// never yield a room with a half-removed participant set.
    pub async fn read_room(&self, room_id: &str) -> Result<Option<RoomSnapshot>, AppError> {
        let mut tx = self.pool.begin().await?;
        let Some(room) = rooms::get_room(&mut *tx, room_id).await? else {
            return Ok(None);
        };
        let parts = participants::list_for_room(&mut *tx, room_id).await?;
        tx.commit().await?;
        Ok(Some(RoomSnapshot {
            room,
            participants: parts,
        }))
    }

    /// List room summaries with participant counts.
    pub async fn list_rooms(&self) -> Result<Vec<RoomSummaryRow>, AppError> {
        Ok(rooms::list_summaries(&self.pool).await?)
    }

    /// List IDs of all open rooms.
    pub async fn list_room_ids(&self) -> Result<Vec<String>, AppError> {
        Ok(rooms::list_room_ids(&self.pool).await?)
    }

    /// Read a room's message history.
    pub async fn messages(&self, room_id: &str, limit: i64) -> Result<Vec<MessageRow>, AppError> {
        Ok(messages::list_for_room(&self.pool, room_id, limit).await?)
    }

    /// Append one message to a room's history.
    pub async fn append_message(&self, msg: &MessageRow) -> Result<(), AppError> {
        Ok(messages::append(&self.pool, msg).await?)
    }

    /// Refresh a participant's heartbeat. A single atomic UPDATE; returns
    /// false when the session is not a member.
    pub async fn touch_heartbeat(
        &self,
        room_id: &str,
        session_id: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<bool, AppError> {
        Ok(participants::touch_heartbeat(&self.pool, room_id, session_id, now).await?)
    }

    /// Transactional read-modify-write of one room.
    ///
    /// `mutate` receives the current snapshot (None when the room does not
    /// exist) and returns what to persist plus a result value. The whole
    /// cycle runs in one write transaction; a failed write leaves the prior
    /// snapshot intact. Busy/locked errors are retried with fresh snapshots
    /// a bounded number of times before surfacing as `Conflict`.
    pub async fn with_room<T, F>(&self, room_id: &str, mutate: F) -> Result<T, AppError>
    where
        F: Fn(Option<RoomSnapshot>) -> Result<(RoomWrite, T), AppError> + Send + Sync,
        T: Send,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.try_with_room(room_id, &mutate).await {
                Err(AppError::Store(e)) if is_busy(&e) => {
                    if attempt >= WRITE_ATTEMPTS {
                        return Err(AppError::Conflict(attempt));
                    }
                    debug!(room_id, attempt, "room write conflict, retrying");
                    tokio::time::sleep(std::time::Duration::from_millis(
                        RETRY_BACKOFF_MS * u64::from(attempt),
                    ))
                    .await;
                }
                other => return other,
            }
        }
    }

    async fn try_with_room<T, F>(&self, room_id: &str, mutate: &F) -> Result<T, AppError>
    where
        F: Fn(Option<RoomSnapshot>) -> Result<(RoomWrite, T), AppError> + Send + Sync,
        T: Send,
    {
        let mut tx = self.pool.begin().await?;

        // touch_room writes first so this transaction holds the write lock
        // before reading; its row count is also the existence check.
        let snapshot = if rooms::touch_room(&mut *tx, room_id).await? {
            let room = rooms::get_room(&mut *tx, room_id)
                .await?
                .ok_or(AppError::RoomNotFound)?;
            let parts = participants::list_for_room(&mut *tx, room_id).await?;
            Some(RoomSnapshot {
                room,
                participants: parts,
            })
        } else {
            None
        };

        // A policy error drops the transaction, rolling back the touch write.
        let (write, out) = mutate(snapshot)?;

        match write {
            RoomWrite::Put(next) => {
                participants::delete_for_room(&mut *tx, room_id).await?;
                for p in &next.participants {
                    participants::insert(&mut *tx, p).await?;
                }
                rooms::set_status(&mut *tx, room_id, next.room.status).await?;
            }
            RoomWrite::Delete => {
                messages::delete_for_room(&mut *tx, room_id).await?;
                participants::delete_for_room(&mut *tx, room_id).await?;
                rooms::delete_room(&mut *tx, room_id).await?;
            }
        }

        tx.commit().await?;
        Ok(out)
    }
}

/// SQLITE_BUSY (5) and SQLITE_LOCKED (6), including their extended codes,
/// mark transient write contention.
fn is_busy(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => match db.code() {
            Some(code) => code
                .parse::<u32>()
                .map(|c| matches!(c & 0xff, 5 | 6))
                .unwrap_or(false),
            None => db.message().contains("database is locked"),
        },
        _ => false,
    }
}
