//! Poll lifecycle: create, start, stop, auto-stop timers
//!
//! Polls move created -> active -> closed. Starting a timed poll arms a
//! single-shot server-owned task that sleeps to the deadline and then
//! closes the poll with the same compare-and-set transition the manual
//! stop uses; whichever path takes the room lock first wins and the loser
//! is a no-op, so a manual stop racing a timer fire never double-closes
//! or loses a close. Many polls may be active in one room at once.

use std::sync::{Arc, Weak};
use std::time::Duration;

use uuid::Uuid;

use super::broadcaster::Envelope;
use super::error::PollError;
use super::protocol::{CreatePollResponse, PollDetails, PollState, PollsResponse, RoomEvent};
use super::registry::RoomRegistry;
use super::room::{Poll, Room};

/// Minimum number of options per poll
pub const MIN_POLL_OPTIONS: usize = 2;

/// Who closed the poll; decides which event is emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CloseCause {
    Manual,
    Timer,
}

impl RoomRegistry {
    // ========================================================================
    // Create
    // ========================================================================

    /// Create a poll in a room (state: created, not yet open for votes)
    pub async fn create_poll(
        &self,
        room_id: &str,
        question: String,
        options: Vec<String>,
        timer_minutes: Option<u64>,
    ) -> Result<CreatePollResponse, PollError> {
        let room = self.get_room(room_id)?;

        let question = question.trim().to_string();
        if question.is_empty() {
            return Err(PollError::InvalidInput(
                "question must not be empty".to_string(),
            ));
        }

        let options: Vec<String> = options
            .iter()
            .map(|option| option.trim().to_string())
            .collect();
        if options.len() < MIN_POLL_OPTIONS {
            return Err(PollError::InvalidInput(format!(
                "poll needs at least {} options",
                MIN_POLL_OPTIONS
            )));
        }
        if options.iter().any(|option| option.is_empty()) {
            return Err(PollError::InvalidInput(
                "options must not be empty".to_string(),
            ));
        }
        for (i, option) in options.iter().enumerate() {
            if options[..i].contains(option) {
                return Err(PollError::InvalidInput(format!(
                    "duplicate option: {}",
                    option
                )));
            }
        }

        if timer_minutes == Some(0) {
            return Err(PollError::InvalidInput(
                "timer_minutes must be at least 1".to_string(),
            ));
        }

        let poll = Poll::new(question, options, timer_minutes);
        let response = CreatePollResponse {
            poll_id: poll.poll_id,
            question: poll.question.clone(),
            options: poll.options.clone(),
        };

        let mut inner = room.inner.lock().await;
        self.poll_rooms.insert(poll.poll_id, room.room_id.clone());
        room.send(Envelope::room(RoomEvent::NewPoll {
            poll_id: poll.poll_id,
            question: poll.question.clone(),
            options: poll.options.clone(),
            timer_minutes: poll.timer_minutes,
        }));
        inner.polls.push(poll);
        drop(inner);

        tracing::info!(
            room_id = %room.room_id,
            poll_id = %response.poll_id,
            "poll created"
        );

        Ok(response)
    }

    // ========================================================================
    // Start
    // ========================================================================

    /// Open a poll for voting; arms the auto-stop timer if one was set
    pub async fn start_poll(&self, poll_id: Uuid) -> Result<(), PollError> {
        let room = self.room_for_poll(poll_id)?;
        let mut inner = room.inner.lock().await;

        let poll = inner.poll_mut(poll_id)?;
        if poll.state != PollState::Created {
            return Err(PollError::InvalidState(format!(
                "poll cannot be started from state {:?}",
                poll.state
            )));
        }

        poll.activate();
        let question = poll.question.clone();
        let options = poll.options.clone();
        let timer_minutes = poll.timer_minutes;

        room.send(Envelope::room(RoomEvent::PollStarted {
            poll_id,
            question,
            options,
            timer_minutes,
        }));

        if let Some(minutes) = timer_minutes {
            let handle = tokio::spawn(auto_stop_poll(
                Arc::downgrade(&room),
                poll_id,
                Duration::from_secs(minutes * 60),
            ));
            inner.timers.insert(poll_id, handle);
        }
        drop(inner);

        tracing::info!(
            room_id = %room.room_id,
            poll_id = %poll_id,
            timer_minutes = ?timer_minutes,
            "poll started"
        );

        Ok(())
    }

    // ========================================================================
    // Stop
    // ========================================================================

    /// Close an active poll and cancel its timer
    pub async fn stop_poll(&self, poll_id: Uuid) -> Result<(), PollError> {
        let room = self.room_for_poll(poll_id)?;

        if !room.close_poll(poll_id, CloseCause::Manual).await? {
            return Err(PollError::InvalidState(
                "poll is not active".to_string(),
            ));
        }

        tracing::info!(room_id = %room.room_id, poll_id = %poll_id, "poll stopped");
        Ok(())
    }

    // ========================================================================
    // Listing
    // ========================================================================

    /// All polls of a room, annotated with live tallies
    pub async fn list_polls(&self, room_id: &str) -> Result<PollsResponse, PollError> {
        let room = self.get_room(room_id)?;
        let inner = room.inner.lock().await;

        let polls = inner
            .polls
            .iter()
            .map(|poll| PollDetails {
                poll_id: poll.poll_id,
                question: poll.question.clone(),
                options: poll.options.clone(),
                is_active: poll.state.is_active(),
                created_at: poll.created_at,
                started_at: poll.started_at,
                closes_at: poll.closes_at,
                vote_counts: poll.tally.clone(),
                total_votes: poll.total_votes(),
            })
            .collect();

        Ok(PollsResponse { polls })
    }
}

impl Room {
    /// Compare-and-set close: active -> closed, else no-op
    ///
    /// Returns `Ok(true)` if this call performed the transition. Both the
    /// manual stop and the timer fire go through here, under the room
    /// lock, so exactly one of a racing pair succeeds and exactly one of
    /// `poll_stopped` / `poll_auto_stopped` is emitted.
    pub(crate) async fn close_poll(
        &self,
        poll_id: Uuid,
        cause: CloseCause,
    ) -> Result<bool, PollError> {
        let mut inner = self.inner.lock().await;

        let poll = inner.poll_mut(poll_id)?;
        if !poll.state.is_active() {
            return Ok(false);
        }
        poll.state = PollState::Closed;

        if let Some(handle) = inner.timers.remove(&poll_id) {
            // The timer fire path is running inside this very task; only
            // the manual path has a live timer to cancel.
            if cause == CloseCause::Manual {
                handle.abort();
            }
        }

        self.send(Envelope::room(match cause {
            CloseCause::Manual => RoomEvent::PollStopped { poll_id },
            CloseCause::Timer => RoomEvent::PollAutoStopped { poll_id },
        }));

        Ok(true)
    }
}

/// Single-shot auto-stop task for one timed poll
///
/// Holds only a weak reference: if the room is wiped while the task
/// sleeps, the upgrade fails and the task exits without touching anything.
async fn auto_stop_poll(room: Weak<Room>, poll_id: Uuid, delay: Duration) {
    tokio::time::sleep(delay).await;

    let Some(room) = room.upgrade() else {
        return;
    };

    match room.close_poll(poll_id, CloseCause::Timer).await {
        Ok(true) => {
            tracing::info!(room_id = %room.room_id, poll_id = %poll_id, "poll auto-stopped");
        }
        Ok(false) => {
            // Lost the race to a manual stop; nothing to do.
        }
        Err(e) => {
            tracing::warn!(poll_id = %poll_id, error = %e, "auto-stop found no poll");
        }
    }
}
