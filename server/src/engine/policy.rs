//! Pure presence decisions. Every function here takes a snapshot and an
//! event and returns the next snapshot plus an outcome; no I/O, no clocks
//! of its own. The coordinator makes these decisions durable; the reaper
//! feeds expiry results back through the same leave decision.

use chrono::{DateTime, Duration, Utc};

use crate::db::models::{ParticipantRow, Role, RoomSnapshot, RoomStatus};

/// Result of a join decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    pub role: Role,
    pub is_new: bool,
}

/// Result of a leave decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub found: bool,
    pub remaining: usize,
    pub room_should_close: bool,
}

/// The room holds its full debate complement and spectating is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomFull;

/// Decide a join. Re-joins by a known session are idempotent: the snapshot
/// comes back unchanged and the already-assigned role is reported, so a
/// reconnect or tab refresh never duplicates a slot or flips a side.
pub fn decide_join(
    mut snapshot: RoomSnapshot,
    session_id: &str,
    user_name: &str,
    stance: Option<Role>,
    now: DateTime<Utc>,
) -> Result<(RoomSnapshot, JoinOutcome), RoomFull> {
    if let Some(existing) = snapshot.participant(session_id) {
        let outcome = JoinOutcome {
            role: existing.role,
            is_new: false,
        };
        return Ok((snapshot, outcome));
    }

    let role = match free_debate_role(&snapshot, stance) {
        Some(role) => role,
        None if snapshot.room.enable_spectators => Role::Spectator,
        None => return Err(RoomFull),
    };

    snapshot.participants.push(ParticipantRow {
        room_id: snapshot.room.id.clone(),
        session_id: session_id.to_string(),
        user_name: user_name.to_string(),
        role,
        joined_at: now,
        last_heartbeat_at: now,
    });
    snapshot.room.status = occupancy_status(&snapshot);

    Ok((snapshot, JoinOutcome { role, is_new: true }))
}

/// Decide a leave. Unknown sessions are a no-op; the caller tears the room
/// down when `room_should_close` is set.
pub fn decide_leave(mut snapshot: RoomSnapshot, session_id: &str) -> (RoomSnapshot, LeaveOutcome) {
    let before = snapshot.participants.len();
    snapshot.participants.retain(|p| p.session_id != session_id);
    let remaining = snapshot.participants.len();

    if remaining == before {
        let outcome = LeaveOutcome {
            found: false,
            remaining,
            room_should_close: false,
        };
        return (snapshot, outcome);
    }

    snapshot.room.status = occupancy_status(&snapshot);
    let outcome = LeaveOutcome {
        found: true,
        remaining,
        room_should_close: remaining == 0,
    };
    (snapshot, outcome)
}

/// Sessions whose heartbeat has lapsed: `last_heartbeat_at + timeout < now`.
/// A heartbeat exactly at the deadline is still alive.
pub fn expired_sessions(
    snapshot: &RoomSnapshot,
    now: DateTime<Utc>,
    timeout: Duration,
) -> Vec<String> {
    snapshot
        .participants
        .iter()
        .filter(|p| p.last_heartbeat_at + timeout < now)
        .map(|p| p.session_id.clone())
        .collect()
}

/// Pick the debate side for a joiner, or None when no side is assignable.
/// A requested stance wins when that side is free; otherwise sides are
/// assigned in the fixed order `pro`, then `con`, so concurrent joins
/// resolve deterministically under replay.
fn free_debate_role(snapshot: &RoomSnapshot, stance: Option<Role>) -> Option<Role> {
    if snapshot.debater_count() >= snapshot.room.max_debaters as usize {
        return None;
    }
    if let Some(wanted) = stance
        && wanted.is_debater()
        && !snapshot.role_occupied(wanted)
    {
        return Some(wanted);
    }
    Role::DEBATE_SIDES
        .into_iter()
        .find(|&side| !snapshot.role_occupied(side))
}

/// Status follows occupancy alone: `active` iff both debate sides are held.
fn occupancy_status(snapshot: &RoomSnapshot) -> RoomStatus {
    if Role::DEBATE_SIDES
        .into_iter()
        .all(|side| snapshot.role_occupied(side))
    {
        RoomStatus::Active
    } else {
        RoomStatus::Waiting
    }
}
