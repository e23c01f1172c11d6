//! Anonymous vote recording
//!
//! A vote is checked and recorded in one critical section under the room
//! lock: token resolution, approval, poll state, option membership, and
//! the already-voted check all happen before the voted-set insert and
//! tally increment, so concurrent requests from the same participant can
//! never double-count. What is stored afterwards is only the aggregate
//! tally and the voted-set; the selected option is never attached to the
//! participant.

use uuid::Uuid;

use super::broadcaster::Envelope;
use super::error::PollError;
use super::protocol::{ApprovalStatus, RoomEvent};
use super::registry::RoomRegistry;

impl RoomRegistry {
    /// Cast a vote on an active poll
    pub async fn vote(
        &self,
        poll_id: Uuid,
        participant_token: &str,
        selected_option: &str,
    ) -> Result<(), PollError> {
        let room = self.room_for_poll(poll_id)?;
        let mut inner = room.inner.lock().await;

        let (participant_id, approval_status) = inner
            .participants
            .iter()
            .find(|p| p.participant_token == participant_token)
            .map(|p| (p.participant_id, p.approval_status))
            .ok_or(PollError::InvalidToken)?;

        if approval_status != ApprovalStatus::Approved {
            return Err(PollError::Forbidden);
        }

        let poll = inner.poll_mut(poll_id)?;

        if !poll.state.is_active() {
            return Err(PollError::InvalidState(
                "poll is not accepting votes".to_string(),
            ));
        }

        if !poll.options.iter().any(|option| option == selected_option) {
            return Err(PollError::InvalidOption);
        }

        if poll.voted.contains(&participant_id) {
            return Err(PollError::AlreadyVoted);
        }

        // The atomic step: eligibility recorded and tally bumped together,
        // still under the room lock.
        poll.voted.insert(participant_id);
        *poll.tally.entry(selected_option.to_string()).or_insert(0) += 1;

        let vote_counts = poll.tally.clone();
        let total_votes = poll.total_votes();

        room.send(Envelope::room(RoomEvent::VoteUpdate {
            poll_id,
            vote_counts,
            total_votes,
        }));
        drop(inner);

        tracing::info!(room_id = %room.room_id, poll_id = %poll_id, "vote recorded");

        Ok(())
    }
}
