//! Error taxonomy for the polling core
//!
//! Every core operation surfaces one of these typed failures to the
//! transport layer; nothing is silently swallowed except per-connection
//! delivery failures in the broadcaster.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// JSON error body returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Polling core error types
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Participant not approved to vote")]
    Forbidden,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Already voted")]
    AlreadyVoted,

    #[error("Room ID already exists")]
    DuplicateRoomId,

    #[error("Invalid participant token")]
    InvalidToken,

    #[error("Invalid option")]
    InvalidOption,
}

impl IntoResponse for PollError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            PollError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            PollError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            PollError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            PollError::InvalidState(_) => (StatusCode::CONFLICT, "INVALID_STATE"),
            PollError::AlreadyVoted => (StatusCode::CONFLICT, "ALREADY_VOTED"),
            PollError::DuplicateRoomId => (StatusCode::CONFLICT, "DUPLICATE_ROOM_ID"),
            PollError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            PollError::InvalidOption => (StatusCode::BAD_REQUEST, "INVALID_OPTION"),
        };

        let body = ApiError::new(self.to_string(), code);

        (status, Json(body)).into_response()
    }
}
