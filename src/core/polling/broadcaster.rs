//! Event envelopes and delivery scoping for room broadcasts
//!
//! All events produced by the core pass through a per-room
//! `tokio::sync::broadcast` channel; the channel send happens while the
//! room mutation lock is held, so subscribers observe events in mutation
//! order. Each event is wrapped in an [`Envelope`] that records its
//! delivery scope: room-wide, or targeted at a single participant token.
//! The WebSocket layer filters targeted envelopes server-side, so delivery
//! scope is never a client decision.

use super::protocol::RoomEvent;

/// Broadcast channel capacity per room
///
/// A subscriber that falls this many events behind is lagged and gets
/// disconnected; clients recover by reconnecting and re-fetching status.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Delivery scope of a broadcast event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventScope {
    /// Deliver to every subscriber of the room
    Room,
    /// Deliver only to subscribers registered with this participant token
    Participant(String),
}

/// An event paired with its delivery scope
#[derive(Debug, Clone)]
pub struct Envelope {
    pub scope: EventScope,
    pub event: RoomEvent,
}

impl Envelope {
    /// Room-wide envelope
    pub fn room(event: RoomEvent) -> Self {
        Self {
            scope: EventScope::Room,
            event,
        }
    }

    /// Envelope targeted at one participant token
    pub fn targeted(token: impl Into<String>, event: RoomEvent) -> Self {
        Self {
            scope: EventScope::Participant(token.into()),
            event,
        }
    }

    /// Whether a subscription registered with `token` may receive this
    /// envelope. Room-wide envelopes are visible to everyone, including
    /// subscriptions with no token.
    pub fn is_visible_to(&self, token: Option<&str>) -> bool {
        match &self.scope {
            EventScope::Room => true,
            EventScope::Participant(target) => token == Some(target.as_str()),
        }
    }
}
