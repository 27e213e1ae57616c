use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};

use crate::db::models::{MessageRow, ParticipantRow, Role, RoomRow, RoomSummaryRow};
use crate::engine::coordinator::NewRoom;
use crate::error::AppError;

use super::app_state::AppState;

// ── Room listing / creation ─────────────────────────────────

/// GET /api/rooms — list open rooms with participant counts.
pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RoomSummaryRow>>, AppError> {
    Ok(Json(state.coordinator.list_rooms().await?))
}

#[derive(Deserialize)]
pub struct CreateRoomRequest {
    pub topic: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub max_debaters: Option<i64>,
    pub enable_spectators: Option<bool>,
    pub duration_secs: Option<i64>,
}

/// POST /api/rooms — create a new debate room.
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateRoomRequest>,
) -> Result<impl IntoResponse, AppError> {
    let room = state
        .coordinator
        .create_room(&NewRoom {
            topic: body.topic,
            title: body.title,
            description: body.description,
            max_debaters: body.max_debaters,
            enable_spectators: body.enable_spectators,
            duration_secs: body.duration_secs,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(room)))
}

// ── Room detail ─────────────────────────────────────────────

#[derive(Serialize)]
pub struct RoomDetailResponse {
    pub room: RoomRow,
    pub participants: Vec<ParticipantRow>,
    pub messages: Vec<MessageRow>,
}

/// GET /api/rooms/{id} — room with participants and message history.
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailResponse>, AppError> {
    let detail = state.coordinator.room_detail(&room_id).await?;
    Ok(Json(RoomDetailResponse {
        room: detail.room,
        participants: detail.participants,
        messages: detail.messages,
    }))
}

// ── Presence: join / leave / heartbeat ──────────────────────

#[derive(Deserialize)]
pub struct JoinRequest {
    pub session_id: String,
    pub user_name: String,
    pub stance: Option<String>,
}

#[derive(Serialize)]
pub struct JoinResponse {
    pub room: RoomRow,
    pub participants: Vec<ParticipantRow>,
    pub my_name: String,
    pub my_role: Role,
    pub is_new: bool,
    pub messages: Vec<MessageRow>,
}

/// POST /api/rooms/{id}/join — join a room or reconnect to it.
pub async fn join_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(body): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, AppError> {
    let stance = match body.stance.as_deref() {
        None | Some("") => None,
        Some(s) => Some(Role::parse_stance(s).ok_or_else(|| {
            AppError::Validation(format!("Unknown stance '{s}' (expected 'pro' or 'con')"))
        })?),
    };

    let result = state
        .coordinator
        .join(&room_id, &body.session_id, &body.user_name, stance)
        .await?;
    Ok(Json(JoinResponse {
        room: result.room,
        participants: result.participants,
        my_name: body.user_name,
        my_role: result.role,
        is_new: result.is_new,
        messages: result.messages,
    }))
}

#[derive(Deserialize)]
pub struct LeaveRequest {
    pub session_id: String,
}

#[derive(Serialize)]
pub struct LeaveResponse {
    pub success: bool,
    pub deleted: bool,
    pub remaining_participants: usize,
}

/// POST /api/rooms/{id}/leave — explicit departure.
pub async fn leave_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(body): Json<LeaveRequest>,
) -> Result<Json<LeaveResponse>, AppError> {
    let result = state.coordinator.leave(&room_id, &body.session_id).await?;
    Ok(Json(LeaveResponse {
        success: result.success,
        deleted: result.room_deleted,
        remaining_participants: result.remaining_participants,
    }))
}

#[derive(Deserialize)]
pub struct HeartbeatRequest {
    pub session_id: String,
}

#[derive(Serialize)]
pub struct HeartbeatResponse {
    pub success: bool,
}

/// POST /api/rooms/{id}/heartbeat — liveness ping. Always 200; `success`
/// is false when the session is no longer a participant.
pub async fn heartbeat(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(body): Json<HeartbeatRequest>,
) -> Result<Json<HeartbeatResponse>, AppError> {
    let success = state
        .coordinator
        .heartbeat(&room_id, &body.session_id)
        .await?;
    Ok(Json(HeartbeatResponse { success }))
}

// ── Messages ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct PostMessageRequest {
    pub session_id: String,
    pub content: String,
}

/// POST /api/rooms/{id}/messages — append a debate turn.
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Json(body): Json<PostMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let msg = state
        .coordinator
        .post_message(&room_id, &body.session_id, &body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(msg)))
}
