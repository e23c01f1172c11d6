//! REST API handlers for the polling core
//!
//! This module provides the HTTP endpoints the transport exposes:
//! - POST   /rooms/create - Create a room
//! - POST   /rooms/join - Join a room as a participant
//! - GET    /rooms/{room_id}/status - Admission counts and active polls
//! - GET    /rooms/{room_id}/polls - All polls with live tallies
//! - GET    /rooms/{room_id}/participants - Participant roster
//! - GET    /rooms/{room_id}/report - Export the report snapshot
//! - DELETE /rooms/{room_id} - Wipe the room
//! - POST   /participants/{participant_id}/approve | /deny
//! - POST   /polls/create | /polls/{poll_id}/start | /stop | /vote
//! - GET    /ws/{room_id} - WebSocket event stream
//!
//! Handlers translate 1:1 into core operations; every failure surfaces as
//! a typed `PollError` response.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use uuid::Uuid;

use super::error::PollError;
use super::protocol::*;
use super::registry::RoomRegistry;
use super::report::RoomReport;
use super::websocket::ws_handler;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the polling API
#[derive(Clone)]
pub struct PollingState {
    /// Registry of live rooms
    pub registry: Arc<RoomRegistry>,
}

impl PollingState {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(RoomRegistry::new()),
        }
    }
}

impl Default for PollingState {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the polling API router
pub fn polling_router(state: PollingState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rooms/create", post(create_room))
        .route("/rooms/join", post(join_room))
        .route("/rooms/{room_id}/status", get(room_status))
        .route("/rooms/{room_id}/polls", get(room_polls))
        .route("/rooms/{room_id}/participants", get(room_participants))
        .route("/rooms/{room_id}/report", get(room_report))
        .route("/rooms/{room_id}", delete(wipe_room))
        .route(
            "/participants/{participant_id}/approve",
            post(approve_participant),
        )
        .route("/participants/{participant_id}/deny", post(deny_participant))
        .route("/polls/create", post(create_poll))
        .route("/polls/{poll_id}/start", post(start_poll))
        .route("/polls/{poll_id}/stop", post(stop_poll))
        .route("/polls/{poll_id}/vote", post(vote))
        .route("/ws/{room_id}", get(ws_handler))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn create_room(
    State(state): State<PollingState>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), PollError> {
    let room = state
        .registry
        .create_room(request.organizer_name, request.custom_room_id)?;

    Ok((
        StatusCode::CREATED,
        Json(CreateRoomResponse {
            room_id: room.room_id.clone(),
            organizer_name: room.organizer_name.clone(),
        }),
    ))
}

async fn join_room(
    State(state): State<PollingState>,
    Json(request): Json<JoinRoomRequest>,
) -> Result<Json<JoinRoomResponse>, PollError> {
    let joined = state
        .registry
        .join_room(&request.room_id, request.participant_name)
        .await?;

    Ok(Json(joined))
}

async fn room_status(
    State(state): State<PollingState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomStatusResponse>, PollError> {
    let room = state.registry.get_room(&room_id)?;
    Ok(Json(room.status().await))
}

async fn room_polls(
    State(state): State<PollingState>,
    Path(room_id): Path<String>,
) -> Result<Json<PollsResponse>, PollError> {
    Ok(Json(state.registry.list_polls(&room_id).await?))
}

async fn room_participants(
    State(state): State<PollingState>,
    Path(room_id): Path<String>,
) -> Result<Json<ParticipantsResponse>, PollError> {
    Ok(Json(state.registry.list_participants(&room_id).await?))
}

async fn room_report(
    State(state): State<PollingState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomReport>, PollError> {
    Ok(Json(state.registry.generate_report(&room_id).await?))
}

async fn wipe_room(
    State(state): State<PollingState>,
    Path(room_id): Path<String>,
) -> Result<Json<MessageResponse>, PollError> {
    state.registry.wipe_room(&room_id).await?;
    Ok(Json(MessageResponse::new("Room data deleted")))
}

async fn approve_participant(
    State(state): State<PollingState>,
    Path(participant_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, PollError> {
    state.registry.approve_participant(participant_id).await?;
    Ok(Json(MessageResponse::new("Participant approved")))
}

async fn deny_participant(
    State(state): State<PollingState>,
    Path(participant_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, PollError> {
    state.registry.deny_participant(participant_id).await?;
    Ok(Json(MessageResponse::new("Participant denied")))
}

async fn create_poll(
    State(state): State<PollingState>,
    Json(request): Json<CreatePollRequest>,
) -> Result<(StatusCode, Json<CreatePollResponse>), PollError> {
    let poll = state
        .registry
        .create_poll(
            &request.room_id,
            request.question,
            request.options,
            request.timer_minutes,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(poll)))
}

async fn start_poll(
    State(state): State<PollingState>,
    Path(poll_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, PollError> {
    state.registry.start_poll(poll_id).await?;
    Ok(Json(MessageResponse::new("Poll started")))
}

async fn stop_poll(
    State(state): State<PollingState>,
    Path(poll_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, PollError> {
    state.registry.stop_poll(poll_id).await?;
    Ok(Json(MessageResponse::new("Poll stopped")))
}

async fn vote(
    State(state): State<PollingState>,
    Path(poll_id): Path<Uuid>,
    Json(request): Json<VoteRequest>,
) -> Result<Json<MessageResponse>, PollError> {
    state
        .registry
        .vote(poll_id, &request.participant_token, &request.selected_option)
        .await?;
    Ok(Json(MessageResponse::new("Vote recorded")))
}

// ============================================================================
// Tests
// ============================================================================
