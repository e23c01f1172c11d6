//! Final report snapshot and room wipe
//!
//! The report is the only artifact that survives a room: a structured
//! snapshot of the organizer, the participant roster (names and admission
//! status, never tokens or choices), and per-poll results. Producing it
//! latches the room as exported; the wipe refuses to run before that, so
//! unexported data is never destroyed. The wipe itself is irreversible:
//! registry entry, indexes, timers, and live connections all go.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::broadcaster::Envelope;
use super::error::PollError;
use super::protocol::{ApprovalStatus, RoomEvent};
use super::registry::RoomRegistry;

// ============================================================================
// Report Snapshot
// ============================================================================

/// A participant as it appears in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportParticipant {
    pub participant_name: String,
    pub approval_status: ApprovalStatus,
    pub joined_at: DateTime<Utc>,
}

/// One poll's results in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportPoll {
    pub poll_id: Uuid,
    pub question: String,
    pub options: Vec<String>,
    pub vote_counts: HashMap<String, u64>,
    pub total_votes: u64,
}

/// Structured snapshot handed to the rendering collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomReport {
    pub room_id: String,
    pub organizer_name: String,
    pub generated_at: DateTime<Utc>,
    pub participants: Vec<ReportParticipant>,
    pub polls: Vec<ReportPoll>,
}

// ============================================================================
// Operations
// ============================================================================

impl RoomRegistry {
    /// Snapshot a room for export and latch it as exported
    pub async fn generate_report(&self, room_id: &str) -> Result<RoomReport, PollError> {
        let room = self.get_room(room_id)?;
        let mut inner = room.inner.lock().await;

        let participants = inner
            .participants
            .iter()
            .map(|p| ReportParticipant {
                participant_name: p.participant_name.clone(),
                approval_status: p.approval_status,
                joined_at: p.joined_at,
            })
            .collect();

        let polls = inner
            .polls
            .iter()
            .map(|poll| ReportPoll {
                poll_id: poll.poll_id,
                question: poll.question.clone(),
                options: poll.options.clone(),
                vote_counts: poll.tally.clone(),
                total_votes: poll.total_votes(),
            })
            .collect();

        inner.report_generated = true;
        drop(inner);

        tracing::info!(room_id = %room.room_id, "report generated");

        Ok(RoomReport {
            room_id: room.room_id.clone(),
            organizer_name: room.organizer_name.clone(),
            generated_at: Utc::now(),
            participants,
            polls,
        })
    }

    /// Irreversibly destroy a room and everything in it
    ///
    /// Fails `InvalidState` if no report has been generated yet, so the
    /// export-before-destroy sequencing is enforced here rather than
    /// trusted to the client.
    pub async fn wipe_room(&self, room_id: &str) -> Result<(), PollError> {
        let room = self.get_room(room_id)?;
        let mut inner = room.inner.lock().await;

        if !inner.report_generated {
            return Err(PollError::InvalidState(
                "room report has not been generated".to_string(),
            ));
        }

        // Unregister first so concurrent lookups start failing NotFound,
        // then tear down children while still holding the room lock.
        self.remove_room(&room.room_id);
        for participant in &inner.participants {
            self.participant_rooms.remove(&participant.participant_id);
        }
        for poll in &inner.polls {
            self.poll_rooms.remove(&poll.poll_id);
        }
        for (_, handle) in inner.timers.drain() {
            handle.abort();
        }
        inner.participants.clear();
        inner.polls.clear();

        // Terminal event: subscribers close their connections on receipt.
        room.send(Envelope::room(RoomEvent::RoomWiped));
        drop(inner);

        tracing::info!(room_id = %room.room_id, "room wiped");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn populated_room(registry: &RoomRegistry) -> (String, Uuid, Uuid) {
        let room = registry.create_room("Alice".to_string(), None).unwrap();
        let room_id = room.room_id.clone();

        let joined = registry
            .join_room(&room_id, "Bob".to_string())
            .await
            .unwrap();
        let bob = registry
            .list_participants(&room_id)
            .await
            .unwrap()
            .participants[0]
            .participant_id;
        registry.approve_participant(bob).await.unwrap();

        let poll = registry
            .create_poll(
                &room_id,
                "Pizza?".to_string(),
                vec!["Yes".to_string(), "No".to_string()],
                Some(10),
            )
            .await
            .unwrap();
        registry.start_poll(poll.poll_id).await.unwrap();
        registry
            .vote(poll.poll_id, &joined.participant_token, "Yes")
            .await
            .unwrap();

        (room_id, bob, poll.poll_id)
    }

    #[tokio::test]
    async fn test_report_contains_names_and_tallies_only() {
        let registry = RoomRegistry::new();
        let (room_id, _, _) = populated_room(&registry).await;

        let report = registry.generate_report(&room_id).await.unwrap();

        assert_eq!(report.organizer_name, "Alice");
        assert_eq!(report.participants.len(), 1);
        assert_eq!(report.participants[0].participant_name, "Bob");
        assert_eq!(
            report.participants[0].approval_status,
            ApprovalStatus::Approved
        );
        assert_eq!(report.polls.len(), 1);
        assert_eq!(report.polls[0].vote_counts["Yes"], 1);
        assert_eq!(report.polls[0].total_votes, 1);

        // No tokens, no per-participant choices
        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("participant_token"));
        assert!(!json.contains("selected_option"));
    }

    #[tokio::test]
    async fn test_wipe_before_report_fails_and_destroys_nothing() {
        let registry = RoomRegistry::new();
        let (room_id, _, _) = populated_room(&registry).await;

        let result = registry.wipe_room(&room_id).await;
        assert!(matches!(result, Err(PollError::InvalidState(_))));

        // Room is intact
        let status = registry.get_room(&room_id).unwrap().status().await;
        assert_eq!(status.participant_count, 1);
        assert_eq!(status.total_polls, 1);
    }

    #[tokio::test]
    async fn test_wipe_after_report_removes_everything() {
        let registry = RoomRegistry::new();
        let (room_id, bob, poll_id) = populated_room(&registry).await;

        registry.generate_report(&room_id).await.unwrap();
        registry.wipe_room(&room_id).await.unwrap();

        assert!(matches!(
            registry.get_room(&room_id),
            Err(PollError::NotFound(_))
        ));
        assert!(registry.room_for_participant(bob).is_err());
        assert!(registry.room_for_poll(poll_id).is_err());
        assert!(registry.list_polls(&room_id).await.is_err());
        assert!(registry.approve_participant(bob).await.is_err());
        assert_eq!(registry.room_count(), 0);
    }

    #[tokio::test]
    async fn test_wipe_emits_terminal_event() {
        let registry = RoomRegistry::new();
        let (room_id, _, _) = populated_room(&registry).await;
        let room = registry.get_room(&room_id).unwrap();
        let mut rx = room.subscribe();

        registry.generate_report(&room_id).await.unwrap();
        registry.wipe_room(&room_id).await.unwrap();

        // Drain until the terminal event; it must be the last one
        loop {
            let envelope = rx.recv().await.unwrap();
            if matches!(envelope.event, RoomEvent::RoomWiped) {
                break;
            }
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_wipe_twice_fails_not_found() {
        let registry = RoomRegistry::new();
        let (room_id, _, _) = populated_room(&registry).await;

        registry.generate_report(&room_id).await.unwrap();
        registry.wipe_room(&room_id).await.unwrap();

        assert!(matches!(
            registry.wipe_room(&room_id).await,
            Err(PollError::NotFound(_))
        ));
    }
}
