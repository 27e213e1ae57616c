use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The side a participant holds within a debate room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Pro,
    Con,
    Spectator,
}

impl Role {
    /// Debate sides in deterministic assignment order.
    pub const DEBATE_SIDES: [Role; 2] = [Role::Pro, Role::Con];

    pub fn is_debater(self) -> bool {
        !matches!(self, Role::Spectator)
    }

    /// Parse a client-requested stance. Only debate sides are accepted;
    /// spectator slots are assigned by policy, never requested.
    pub fn parse_stance(s: &str) -> Option<Role> {
        match s {
            "pro" => Some(Role::Pro),
            "con" => Some(Role::Con),
            _ => None,
        }
    }
}

/// Room status, a pure function of debate-role occupancy. A room that
/// empties is deleted outright, so there is no stored `closed` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Active,
}

/// A stored debate room.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RoomRow {
    pub id: String,
    pub topic: String,
    pub title: String,
    pub description: String,
    pub status: RoomStatus,
    pub max_debaters: i64,
    pub enable_spectators: bool,
    pub duration_secs: i64,
    pub created_at: DateTime<Utc>,
}

/// A room membership record, keyed by (room_id, session_id).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ParticipantRow {
    pub room_id: String,
    pub session_id: String,
    pub user_name: String,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
    pub last_heartbeat_at: DateTime<Utc>,
}

/// A stored chat/debate message.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MessageRow {
    pub id: String,
    pub room_id: String,
    pub sender_session_id: String,
    pub sender_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Room listing entry with its current participant count.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RoomSummaryRow {
    pub id: String,
    pub topic: String,
    pub title: String,
    pub status: RoomStatus,
    pub max_debaters: i64,
    pub enable_spectators: bool,
    pub created_at: DateTime<Utc>,
    pub participant_count: i64,
}

/// Parameters for inserting a new room (avoids too-many-arguments).
pub struct CreateRoomParams<'a> {
    pub id: &'a str,
    pub topic: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub max_debaters: i64,
    pub enable_spectators: bool,
    pub duration_secs: i64,
}

/// A consistent view of one room and its participants, read and written
/// atomically by the store. The presence policy operates on snapshots only.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub room: RoomRow,
    pub participants: Vec<ParticipantRow>,
}

impl RoomSnapshot {
    pub fn participant(&self, session_id: &str) -> Option<&ParticipantRow> {
        self.participants
            .iter()
            .find(|p| p.session_id == session_id)
    }

    pub fn role_occupied(&self, role: Role) -> bool {
        self.participants.iter().any(|p| p.role == role)
    }

    pub fn debater_count(&self) -> usize {
        self.participants.iter().filter(|p| p.role.is_debater()).count()
    }
}
