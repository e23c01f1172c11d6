//! Secret Poll - Anonymous Real-Time Meeting Polls
//!
//! Backend for ephemeral polling sessions: an organizer opens a room,
//! admits participants, runs concurrent polls with optional auto-stop
//! timers, and exports a final report before the room is wiped.

pub mod core;
