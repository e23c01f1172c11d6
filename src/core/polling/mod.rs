//! Anonymous real-time polling for ephemeral meeting rooms
//!
//! Provides the room/participant/poll/vote state machine with:
//! - Short-code rooms created by an organizer
//! - Participant admission (pending/approved/denied) with opaque tokens
//! - Concurrent polls per room with optional server-owned auto-stop timers
//! - Anonymous tallies (no stored participant-to-choice link)
//! - Per-room WebSocket event fan-out
//! - Final report snapshot followed by an irreversible wipe

mod api;
mod broadcaster;
mod error;
mod gatekeeper;
mod polls;
mod protocol;
mod registry;
mod report;
mod room;
mod votes;
mod websocket;

pub use api::*;
pub use broadcaster::*;
pub use error::*;
pub use polls::*;
pub use protocol::*;
pub use registry::*;
pub use report::*;
pub use room::*;
pub use websocket::*;
