//! Wire types for the polling API and event stream
//!
//! This module defines the request/response DTOs for the REST API and the
//! event types broadcast to room subscribers over WebSocket.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Lifecycle Enums
// ============================================================================

/// Admission state of a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Waiting for the organizer's decision
    Pending,
    /// Admitted; may vote
    Approved,
    /// Refused admission; may be re-approved later
    Denied,
}

/// Lifecycle state of a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollState {
    /// Created but not yet open for votes
    Created,
    /// Open for votes
    Active,
    /// Closed; no further votes accepted
    Closed,
}

impl PollState {
    pub fn is_active(&self) -> bool {
        matches!(self, PollState::Active)
    }
}

// ============================================================================
// REST API DTOs
// ============================================================================

/// Request to create a new room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    /// Display name of the room organizer
    pub organizer_name: String,
    /// Optional custom room code (3-10 alphanumeric characters)
    pub custom_room_id: Option<String>,
}

/// Response after creating a room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub room_id: String,
    pub organizer_name: String,
}

/// Request to join a room as a participant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRoomRequest {
    pub room_id: String,
    pub participant_name: String,
}

/// Response after joining a room
///
/// The token is the participant's only credential; it is returned exactly
/// once here and never appears in any listing or broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRoomResponse {
    pub participant_token: String,
    pub participant_name: String,
    pub room_id: String,
    pub approval_status: ApprovalStatus,
    pub organizer_name: String,
}

/// Request to create a poll in a room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePollRequest {
    pub room_id: String,
    pub question: String,
    pub options: Vec<String>,
    /// Optional auto-stop timer in minutes
    pub timer_minutes: Option<u64>,
}

/// Response after creating a poll
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePollResponse {
    pub poll_id: Uuid,
    pub question: String,
    pub options: Vec<String>,
}

/// Request to cast a vote on a poll
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub participant_token: String,
    pub selected_option: String,
}

/// Generic acknowledgement response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Room status summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomStatusResponse {
    pub room_id: String,
    pub organizer_name: String,
    pub participant_count: usize,
    pub approved_count: usize,
    pub pending_count: usize,
    pub total_polls: usize,
    pub active_polls: Vec<ActivePollInfo>,
    pub active_poll_count: usize,
}

/// Summary of an active poll inside the status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivePollInfo {
    pub poll_id: Uuid,
    pub question: String,
    pub options: Vec<String>,
    pub is_active: bool,
}

/// A poll annotated with live results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollDetails {
    pub poll_id: Uuid,
    pub question: String,
    pub options: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    /// Deadline derived from `started_at` + timer; absent for untimed polls
    pub closes_at: Option<DateTime<Utc>>,
    pub vote_counts: HashMap<String, u64>,
    pub total_votes: u64,
}

/// List of polls for a room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollsResponse {
    pub polls: Vec<PollDetails>,
}

/// A participant as visible to the organizer (no token)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantInfo {
    pub participant_id: Uuid,
    pub participant_name: String,
    pub approval_status: ApprovalStatus,
    pub joined_at: DateTime<Utc>,
}

/// List of participants for a room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantsResponse {
    pub participants: Vec<ParticipantInfo>,
}

// ============================================================================
// Broadcast Events
// ============================================================================

/// Events fanned out to a room's WebSocket subscribers
///
/// No event ever carries a participant-to-choice linkage; vote updates
/// expose aggregate counts only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    /// Aggregate admission counts changed (join, approve, deny)
    ParticipantUpdate {
        participant_count: usize,
        approved_count: usize,
        pending_count: usize,
    },
    /// Targeted at one participant: they were admitted
    ParticipantApproved { participant_name: String },
    /// Targeted at one participant: they were refused
    ParticipantDenied { participant_name: String },
    /// A poll was created in the room
    NewPoll {
        poll_id: Uuid,
        question: String,
        options: Vec<String>,
        timer_minutes: Option<u64>,
    },
    /// A poll opened for voting
    PollStarted {
        poll_id: Uuid,
        question: String,
        options: Vec<String>,
        timer_minutes: Option<u64>,
    },
    /// The organizer closed a poll
    PollStopped { poll_id: Uuid },
    /// The server-side timer closed a poll
    PollAutoStopped { poll_id: Uuid },
    /// A vote was recorded; full tally for the poll
    VoteUpdate {
        poll_id: Uuid,
        vote_counts: HashMap<String, u64>,
        total_votes: u64,
    },
    /// Terminal event: the room was wiped, connections close after this
    RoomWiped,
}
