//! Participant admission: join, approve, deny
//!
//! Joining mints a fresh 128-bit hex token, the participant's only
//! credential. Admission transitions are organizer-driven:
//! pending -> approved, pending -> denied, and denied -> approved
//! (mistakes are correctable). An approved participant is never demoted.
//! Every transition emits a token-targeted event for the affected
//! participant plus an aggregate `participant_update` for the room.

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use super::broadcaster::Envelope;
use super::error::PollError;
use super::protocol::{
    ApprovalStatus, JoinRoomResponse, ParticipantInfo, ParticipantsResponse, RoomEvent,
};
use super::registry::RoomRegistry;
use super::room::{Participant, RoomInner};

impl RoomRegistry {
    // ========================================================================
    // Join
    // ========================================================================

    /// Join a room as a pending participant
    pub async fn join_room(
        &self,
        room_id: &str,
        participant_name: String,
    ) -> Result<JoinRoomResponse, PollError> {
        let room = self.get_room(room_id)?;

        let participant = Participant {
            participant_id: Uuid::new_v4(),
            participant_name: participant_name.clone(),
            participant_token: generate_participant_token(),
            approval_status: ApprovalStatus::Pending,
            joined_at: Utc::now(),
        };

        let response = JoinRoomResponse {
            participant_token: participant.participant_token.clone(),
            participant_name,
            room_id: room.room_id.clone(),
            approval_status: ApprovalStatus::Pending,
            organizer_name: room.organizer_name.clone(),
        };

        let mut inner = room.inner.lock().await;
        self.participant_rooms
            .insert(participant.participant_id, room.room_id.clone());
        let participant_id = participant.participant_id;
        inner.participants.push(participant);
        send_participant_update(&room, &inner);
        drop(inner);

        tracing::info!(
            room_id = %room.room_id,
            participant_id = %participant_id,
            "participant joined"
        );

        Ok(response)
    }

    // ========================================================================
    // Approve / Deny
    // ========================================================================

    /// Admit a participant (pending or previously denied)
    pub async fn approve_participant(&self, participant_id: Uuid) -> Result<(), PollError> {
        self.set_approval(participant_id, ApprovalStatus::Approved)
            .await
    }

    /// Refuse a participant admission
    pub async fn deny_participant(&self, participant_id: Uuid) -> Result<(), PollError> {
        self.set_approval(participant_id, ApprovalStatus::Denied)
            .await
    }

    async fn set_approval(
        &self,
        participant_id: Uuid,
        target: ApprovalStatus,
    ) -> Result<(), PollError> {
        let room = self.room_for_participant(participant_id)?;
        let mut inner = room.inner.lock().await;

        let participant = inner.participant_mut(participant_id)?;

        // Approved participants may already hold votes; demoting them
        // would strand entries in voted-sets.
        if participant.approval_status == ApprovalStatus::Approved
            && target == ApprovalStatus::Denied
        {
            return Err(PollError::InvalidState(
                "approved participants cannot be denied".to_string(),
            ));
        }

        participant.approval_status = target;
        let token = participant.participant_token.clone();
        let name = participant.participant_name.clone();

        let event = match target {
            ApprovalStatus::Approved => RoomEvent::ParticipantApproved {
                participant_name: name,
            },
            ApprovalStatus::Denied => RoomEvent::ParticipantDenied {
                participant_name: name,
            },
            ApprovalStatus::Pending => unreachable!("pending is never a transition target"),
        };
        room.send(Envelope::targeted(token, event));
        send_participant_update(&room, &inner);
        drop(inner);

        tracing::info!(
            room_id = %room.room_id,
            participant_id = %participant_id,
            status = ?target,
            "participant admission updated"
        );

        Ok(())
    }

    // ========================================================================
    // Listing
    // ========================================================================

    /// List a room's participants; tokens are never exposed here
    pub async fn list_participants(&self, room_id: &str) -> Result<ParticipantsResponse, PollError> {
        let room = self.get_room(room_id)?;
        let inner = room.inner.lock().await;

        let participants = inner
            .participants
            .iter()
            .map(|p| ParticipantInfo {
                participant_id: p.participant_id,
                participant_name: p.participant_name.clone(),
                approval_status: p.approval_status,
                joined_at: p.joined_at,
            })
            .collect();

        Ok(ParticipantsResponse { participants })
    }
}

/// Aggregate counts event, emitted under the room lock
fn send_participant_update(room: &super::room::Room, inner: &RoomInner) {
    let (participant_count, approved_count, pending_count) = inner.admission_counts();
    room.send(Envelope::room(RoomEvent::ParticipantUpdate {
        participant_count,
        approved_count,
        pending_count,
    }));
}

/// Fresh unguessable participant credential: 128 random bits, hex-encoded
fn generate_participant_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::super::broadcaster::EventScope;
    use super::*;

    async fn room_with_participant(registry: &RoomRegistry) -> (String, JoinRoomResponse) {
        let room = registry.create_room("Alice".to_string(), None).unwrap();
        let joined = registry
            .join_room(&room.room_id, "Bob".to_string())
            .await
            .unwrap();
        (room.room_id.clone(), joined)
    }

    async fn participant_id_of(registry: &RoomRegistry, room_id: &str, name: &str) -> Uuid {
        registry
            .list_participants(room_id)
            .await
            .unwrap()
            .participants
            .into_iter()
            .find(|p| p.participant_name == name)
            .unwrap()
            .participant_id
    }

    #[test]
    fn test_token_is_128_bit_hex() {
        let token = generate_participant_token();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

        // Two tokens never collide in practice
        assert_ne!(token, generate_participant_token());
    }

    #[tokio::test]
    async fn test_join_starts_pending() {
        let registry = RoomRegistry::new();
        let (_, joined) = room_with_participant(&registry).await;

        assert_eq!(joined.approval_status, ApprovalStatus::Pending);
        assert_eq!(joined.organizer_name, "Alice");
        assert_eq!(joined.participant_token.len(), 32);
    }

    #[tokio::test]
    async fn test_join_unknown_room_fails() {
        let registry = RoomRegistry::new();
        let result = registry.join_room("NOPE42", "Bob".to_string()).await;

        assert!(matches!(result, Err(PollError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_approve_pending_participant() {
        let registry = RoomRegistry::new();
        let (room_id, _) = room_with_participant(&registry).await;
        let bob = participant_id_of(&registry, &room_id, "Bob").await;

        registry.approve_participant(bob).await.unwrap();

        let listed = registry.list_participants(&room_id).await.unwrap();
        assert_eq!(
            listed.participants[0].approval_status,
            ApprovalStatus::Approved
        );
    }

    #[tokio::test]
    async fn test_denied_participant_can_be_reapproved() {
        let registry = RoomRegistry::new();
        let (room_id, _) = room_with_participant(&registry).await;
        let bob = participant_id_of(&registry, &room_id, "Bob").await;

        registry.deny_participant(bob).await.unwrap();
        registry.approve_participant(bob).await.unwrap();

        let listed = registry.list_participants(&room_id).await.unwrap();
        assert_eq!(
            listed.participants[0].approval_status,
            ApprovalStatus::Approved
        );
    }

    #[tokio::test]
    async fn test_approved_participant_cannot_be_denied() {
        let registry = RoomRegistry::new();
        let (room_id, _) = room_with_participant(&registry).await;
        let bob = participant_id_of(&registry, &room_id, "Bob").await;

        registry.approve_participant(bob).await.unwrap();
        let result = registry.deny_participant(bob).await;

        assert!(matches!(result, Err(PollError::InvalidState(_))));

        let listed = registry.list_participants(&room_id).await.unwrap();
        assert_eq!(
            listed.participants[0].approval_status,
            ApprovalStatus::Approved
        );
    }

    #[tokio::test]
    async fn test_approve_unknown_participant_fails() {
        let registry = RoomRegistry::new();
        let result = registry.approve_participant(Uuid::new_v4()).await;

        assert!(matches!(result, Err(PollError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_approval_emits_targeted_then_aggregate_event() {
        let registry = RoomRegistry::new();
        let (room_id, joined) = room_with_participant(&registry).await;
        let bob = participant_id_of(&registry, &room_id, "Bob").await;

        let room = registry.get_room(&room_id).unwrap();
        let mut rx = room.subscribe();

        registry.approve_participant(bob).await.unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(
            first.scope,
            EventScope::Participant(joined.participant_token.clone())
        );
        assert!(matches!(
            first.event,
            RoomEvent::ParticipantApproved { .. }
        ));

        let second = rx.recv().await.unwrap();
        assert_eq!(second.scope, EventScope::Room);
        match second.event {
            RoomEvent::ParticipantUpdate {
                participant_count,
                approved_count,
                pending_count,
            } => {
                assert_eq!(participant_count, 1);
                assert_eq!(approved_count, 1);
                assert_eq!(pending_count, 0);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_join_emits_participant_update() {
        let registry = RoomRegistry::new();
        let room = registry.create_room("Alice".to_string(), None).unwrap();
        let mut rx = room.subscribe();

        registry
            .join_room(&room.room_id, "Bob".to_string())
            .await
            .unwrap();

        let envelope = rx.recv().await.unwrap();
        match envelope.event {
            RoomEvent::ParticipantUpdate {
                participant_count,
                pending_count,
                ..
            } => {
                assert_eq!(participant_count, 1);
                assert_eq!(pending_count, 1);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_listing_never_contains_tokens() {
        let registry = RoomRegistry::new();
        let (room_id, joined) = room_with_participant(&registry).await;

        let listed = registry.list_participants(&room_id).await.unwrap();
        let json = serde_json::to_string(&listed).unwrap();

        assert!(!json.contains(&joined.participant_token));
    }
}
