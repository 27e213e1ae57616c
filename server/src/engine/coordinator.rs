//! Room lifecycle orchestration: makes the pure presence decisions durable
//! and race-free by running them inside the store's per-room transactional
//! read-modify-write.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::db::models::{
    CreateRoomParams, MessageRow, ParticipantRow, Role, RoomRow, RoomSummaryRow,
};
use crate::db::store::{RoomStore, RoomWrite};
use crate::engine::policy;
use crate::engine::validation;
use crate::error::AppError;

/// Message history cap for room detail reads.
const MESSAGE_HISTORY_LIMIT: i64 = 200;

/// Settings applied to new rooms when the creator leaves them unspecified.
#[derive(Debug, Clone, Copy)]
pub struct RoomDefaults {
    pub max_debaters: i64,
    pub enable_spectators: bool,
    pub duration_secs: i64,
}

impl Default for RoomDefaults {
    fn default() -> Self {
        Self {
            max_debaters: 2,
            enable_spectators: true,
            duration_secs: 1800,
        }
    }
}

/// Fields for creating a room.
pub struct NewRoom {
    pub topic: String,
    pub title: String,
    pub description: String,
    pub max_debaters: Option<i64>,
    pub enable_spectators: Option<bool>,
    pub duration_secs: Option<i64>,
}

/// Post-join view of the room, including message history.
pub struct JoinResult {
    pub room: RoomRow,
    pub participants: Vec<ParticipantRow>,
    pub role: Role,
    pub is_new: bool,
    pub messages: Vec<MessageRow>,
}

pub struct LeaveResult {
    pub success: bool,
    pub room_deleted: bool,
    pub remaining_participants: usize,
}

pub struct RoomDetail {
    pub room: RoomRow,
    pub participants: Vec<ParticipantRow>,
    pub messages: Vec<MessageRow>,
}

#[derive(Clone)]
pub struct Coordinator {
    store: RoomStore,
    defaults: RoomDefaults,
}

impl Coordinator {
    pub fn new(store: RoomStore, defaults: RoomDefaults) -> Self {
        Self { store, defaults }
    }

    pub fn store(&self) -> &RoomStore {
        &self.store
    }

    /// Create a room in `waiting` status with zero participants.
    pub async fn create_room(&self, req: &NewRoom) -> Result<RoomRow, AppError> {
        validation::validate_topic(&req.topic).map_err(AppError::Validation)?;
        validation::validate_title(&req.title).map_err(AppError::Validation)?;
        validation::validate_description(&req.description).map_err(AppError::Validation)?;

        let max_debaters = req.max_debaters.unwrap_or(self.defaults.max_debaters);
        if !(1..=Role::DEBATE_SIDES.len() as i64).contains(&max_debaters) {
            return Err(AppError::Validation(format!(
                "max_debaters must be between 1 and {}",
                Role::DEBATE_SIDES.len()
            )));
        }

        let id = Uuid::new_v4().to_string();
        let room = self
            .store
            .create_room(&CreateRoomParams {
                id: &id,
                topic: &req.topic,
                title: &req.title,
                description: &req.description,
                max_debaters,
                enable_spectators: req
                    .enable_spectators
                    .unwrap_or(self.defaults.enable_spectators),
                duration_secs: req.duration_secs.unwrap_or(self.defaults.duration_secs),
            })
            .await?;

        info!(room_id = %room.id, topic = %room.topic, "room created");
        Ok(room)
    }

    /// List all open rooms with participant counts.
    pub async fn list_rooms(&self) -> Result<Vec<RoomSummaryRow>, AppError> {
        self.store.list_rooms().await
    }

    /// Read one room with participants and message history.
    pub async fn room_detail(&self, room_id: &str) -> Result<RoomDetail, AppError> {
        let snapshot = self
            .store
            .read_room(room_id)
            .await?
            .ok_or(AppError::RoomNotFound)?;
        let messages = self.store.messages(room_id, MESSAGE_HISTORY_LIMIT).await?;
        Ok(RoomDetail {
            room: snapshot.room,
            participants: snapshot.participants,
            messages,
        })
    }

    /// Join a room. Role assignment happens inside the room's exclusive
    /// write section, so two concurrent joins can never both take the same
    /// debate side.
    pub async fn join(
        &self,
        room_id: &str,
        session_id: &str,
        user_name: &str,
        stance: Option<Role>,
    ) -> Result<JoinResult, AppError> {
        validation::validate_session_id(session_id).map_err(AppError::Validation)?;
        validation::validate_user_name(user_name).map_err(AppError::Validation)?;

        let session = session_id.to_string();
        let name = user_name.to_string();
        let outcome = self
            .store
            .with_room(room_id, move |snapshot| {
                let snap = snapshot.ok_or(AppError::RoomNotFound)?;
                let (next, outcome) =
                    policy::decide_join(snap, &session, &name, stance, Utc::now())
                        .map_err(|_| AppError::RoomFull)?;
                Ok((RoomWrite::Put(next), outcome))
            })
            .await?;

        if outcome.is_new {
            info!(room_id, session_id, role = ?outcome.role, "participant joined");
        }

        // Post-write detail read. The room can only be gone again if every
        // participant including this one already left.
        let detail = self.room_detail(room_id).await?;
        Ok(JoinResult {
            room: detail.room,
            participants: detail.participants,
            role: outcome.role,
            is_new: outcome.is_new,
            messages: detail.messages,
        })
    }

    /// Leave a room. When the last participant goes, the room is deleted in
    /// the same exclusive section — no caller can observe an empty room.
    pub async fn leave(&self, room_id: &str, session_id: &str) -> Result<LeaveResult, AppError> {
        validation::validate_session_id(session_id).map_err(AppError::Validation)?;

        let session = session_id.to_string();
        let outcome = self
            .store
            .with_room(room_id, move |snapshot| {
                let snap = snapshot.ok_or(AppError::RoomNotFound)?;
                let (next, outcome) = policy::decide_leave(snap, &session);
                let write = if outcome.room_should_close {
                    RoomWrite::Delete
                } else {
                    RoomWrite::Put(next)
                };
                Ok((write, outcome))
            })
            .await?;

        if outcome.found {
            info!(
                room_id,
                session_id,
                remaining = outcome.remaining,
                deleted = outcome.room_should_close,
                "participant left"
            );
        }

        Ok(LeaveResult {
            success: outcome.found,
            room_deleted: outcome.room_should_close,
            remaining_participants: outcome.remaining,
        })
    }

    /// Refresh a session's liveness. Best-effort: returns false for unknown
    /// rooms or sessions instead of erroring, so a heartbeat racing a leave
    /// is silently ignored rather than resurrecting the participant.
    pub async fn heartbeat(&self, room_id: &str, session_id: &str) -> Result<bool, AppError> {
        if session_id.is_empty() {
            return Ok(false);
        }
        self.store
            .touch_heartbeat(room_id, session_id, Utc::now())
            .await
    }

    /// Append a chat message from a current debater.
    pub async fn post_message(
        &self,
        room_id: &str,
        session_id: &str,
        content: &str,
    ) -> Result<MessageRow, AppError> {
        validation::validate_session_id(session_id).map_err(AppError::Validation)?;
        validation::validate_message(content).map_err(AppError::Validation)?;

        let snapshot = self
            .store
            .read_room(room_id)
            .await?
            .ok_or(AppError::RoomNotFound)?;
        let sender = snapshot
            .participant(session_id)
            .ok_or_else(|| AppError::Validation("Sender is not in the room".into()))?;
        if !sender.role.is_debater() {
            return Err(AppError::Validation("Spectators cannot post messages".into()));
        }

        let msg = MessageRow {
            id: Uuid::new_v4().to_string(),
            room_id: room_id.to_string(),
            sender_session_id: sender.session_id.clone(),
            sender_name: sender.user_name.clone(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.store.append_message(&msg).await?;
        Ok(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::RoomStatus;
    use crate::db::pool::{create_pool, run_migrations};

    async fn setup() -> Coordinator {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        Coordinator::new(RoomStore::new(pool), RoomDefaults::default())
    }

    fn new_room() -> NewRoom {
        NewRoom {
            topic: "Pineapple on pizza".into(),
            title: "Friday debate".into(),
            description: "".into(),
            max_debaters: None,
            enable_spectators: None,
            duration_secs: None,
        }
    }

    #[tokio::test]
    async fn join_assigns_sides_and_activates() {
        let coord = setup().await;
        let room = coord.create_room(&new_room()).await.unwrap();

        let alice = coord
            .join(&room.id, "s1", "Alice", Some(Role::Pro))
            .await
            .unwrap();
        assert_eq!(alice.role, Role::Pro);
        assert!(alice.is_new);
        assert_eq!(alice.room.status, RoomStatus::Waiting);

        let bob = coord
            .join(&room.id, "s2", "Bob", Some(Role::Con))
            .await
            .unwrap();
        assert_eq!(bob.role, Role::Con);
        assert_eq!(bob.room.status, RoomStatus::Active);
        assert_eq!(bob.participants.len(), 2);
    }

    #[tokio::test]
    async fn rejoin_same_session_is_idempotent() {
        let coord = setup().await;
        let room = coord.create_room(&new_room()).await.unwrap();

        coord
            .join(&room.id, "s1", "Alice", Some(Role::Pro))
            .await
            .unwrap();
        let again = coord
            .join(&room.id, "s1", "Alice", Some(Role::Pro))
            .await
            .unwrap();
        assert!(!again.is_new);
        assert_eq!(again.role, Role::Pro);
        assert_eq!(again.participants.len(), 1);
    }

    #[tokio::test]
    async fn leaves_count_down_and_delete_room() {
        let coord = setup().await;
        let room = coord.create_room(&new_room()).await.unwrap();
        coord.join(&room.id, "s1", "Alice", None).await.unwrap();
        coord.join(&room.id, "s2", "Bob", None).await.unwrap();

        let first = coord.leave(&room.id, "s1").await.unwrap();
        assert!(first.success);
        assert!(!first.room_deleted);
        assert_eq!(first.remaining_participants, 1);

        let second = coord.leave(&room.id, "s2").await.unwrap();
        assert!(second.success);
        assert!(second.room_deleted);
        assert_eq!(second.remaining_participants, 0);

        let rejoin = coord.join(&room.id, "s3", "Carol", None).await;
        assert!(matches!(rejoin, Err(AppError::RoomNotFound)));
    }

    #[tokio::test]
    async fn leave_unknown_session_reports_failure() {
        let coord = setup().await;
        let room = coord.create_room(&new_room()).await.unwrap();
        coord.join(&room.id, "s1", "Alice", None).await.unwrap();

        let result = coord.leave(&room.id, "ghost").await.unwrap();
        assert!(!result.success);
        assert!(!result.room_deleted);
        assert_eq!(result.remaining_participants, 1);
    }

    #[tokio::test]
    async fn heartbeat_for_member_and_non_member() {
        let coord = setup().await;
        let room = coord.create_room(&new_room()).await.unwrap();
        coord.join(&room.id, "s1", "Alice", None).await.unwrap();

        assert!(coord.heartbeat(&room.id, "s1").await.unwrap());
        assert!(!coord.heartbeat(&room.id, "ghost").await.unwrap());
        assert!(!coord.heartbeat("nosuch-room", "s1").await.unwrap());

        // A late heartbeat after leaving must not recreate the membership
        coord.leave(&room.id, "s1").await.unwrap();
        assert!(!coord.heartbeat(&room.id, "s1").await.unwrap());
    }

    #[tokio::test]
    async fn join_validation() {
        let coord = setup().await;
        let room = coord.create_room(&new_room()).await.unwrap();

        let missing_session = coord.join(&room.id, "", "Alice", None).await;
        assert!(matches!(missing_session, Err(AppError::Validation(_))));

        let missing_name = coord.join(&room.id, "s1", "", None).await;
        assert!(matches!(missing_name, Err(AppError::Validation(_))));

        let bad_room = coord.join("nosuch", "s1", "Alice", None).await;
        assert!(matches!(bad_room, Err(AppError::RoomNotFound)));
    }

    #[tokio::test]
    async fn full_room_without_spectators_rejects() {
        let coord = setup().await;
        let mut req = new_room();
        req.enable_spectators = Some(false);
        let room = coord.create_room(&req).await.unwrap();
        coord.join(&room.id, "s1", "Alice", None).await.unwrap();
        coord.join(&room.id, "s2", "Bob", None).await.unwrap();

        let third = coord.join(&room.id, "s3", "Carol", None).await;
        assert!(matches!(third, Err(AppError::RoomFull)));
    }

    #[tokio::test]
    async fn create_room_validation() {
        let coord = setup().await;

        let mut req = new_room();
        req.topic = "".into();
        assert!(matches!(
            coord.create_room(&req).await,
            Err(AppError::Validation(_))
        ));

        let mut req = new_room();
        req.max_debaters = Some(7);
        assert!(matches!(
            coord.create_room(&req).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn messages_flow_through_room_detail() {
        let coord = setup().await;
        let room = coord.create_room(&new_room()).await.unwrap();
        coord.join(&room.id, "s1", "Alice", None).await.unwrap();
        coord.join(&room.id, "s2", "Bob", None).await.unwrap();
        coord.join(&room.id, "s3", "Eve", None).await.unwrap(); // spectator

        coord
            .post_message(&room.id, "s1", "opening statement")
            .await
            .unwrap();

        let spectator_post = coord.post_message(&room.id, "s3", "boo").await;
        assert!(matches!(spectator_post, Err(AppError::Validation(_))));

        let detail = coord.room_detail(&room.id).await.unwrap();
        assert_eq!(detail.messages.len(), 1);
        assert_eq!(detail.messages[0].sender_name, "Alice");

        let rejoin = coord.join(&room.id, "s4", "Dan", None).await.unwrap();
        assert_eq!(rejoin.messages.len(), 1, "join returns message history");
    }
}
