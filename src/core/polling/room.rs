//! Room state and the per-room serialization point
//!
//! A [`Room`] owns all state for one polling session: its participants,
//! its polls (with tallies and voted-sets), and any armed auto-stop
//! timers. Everything mutable sits behind a single `tokio::sync::Mutex`,
//! which is the unit of mutual exclusion demanded by the concurrency
//! model: one room's mutations are serialized, different rooms proceed in
//! parallel. The lock is held only across in-memory transitions and the
//! synchronous broadcast send, never across I/O or timer waits.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::broadcaster::{EVENT_CHANNEL_CAPACITY, Envelope};
use super::error::PollError;
use super::protocol::{ActivePollInfo, ApprovalStatus, PollState, RoomStatusResponse};

// ============================================================================
// Participant
// ============================================================================

/// An attendee admitted to (or pending admission to) a room
#[derive(Debug, Clone)]
pub struct Participant {
    pub participant_id: Uuid,
    pub participant_name: String,
    /// Opaque 128-bit credential; the only vote-authentication secret
    pub participant_token: String,
    pub approval_status: ApprovalStatus,
    pub joined_at: DateTime<Utc>,
}

// ============================================================================
// Poll
// ============================================================================

/// A single question with discrete options and an independent lifecycle
///
/// Vote state is split in two deliberately: `tally` maps options to
/// aggregate counts, and `voted` records which participants have voted at
/// all. The two are never joined, so no record links a participant to the
/// option they selected.
#[derive(Debug)]
pub struct Poll {
    pub poll_id: Uuid,
    pub question: String,
    pub options: Vec<String>,
    pub timer_minutes: Option<u64>,
    pub state: PollState,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub closes_at: Option<DateTime<Utc>>,
    /// Aggregate counts per option; every option is present from creation
    pub tally: HashMap<String, u64>,
    /// Participants who have voted, for eligibility checks only
    pub voted: HashSet<Uuid>,
}

impl Poll {
    pub(crate) fn new(question: String, options: Vec<String>, timer_minutes: Option<u64>) -> Self {
        let tally = options.iter().map(|option| (option.clone(), 0)).collect();
        Self {
            poll_id: Uuid::new_v4(),
            question,
            options,
            timer_minutes,
            state: PollState::Created,
            created_at: Utc::now(),
            started_at: None,
            closes_at: None,
            tally,
            voted: HashSet::new(),
        }
    }

    /// Mark the poll active and derive its deadline
    pub(crate) fn activate(&mut self) {
        let now = Utc::now();
        self.state = PollState::Active;
        self.started_at = Some(now);
        self.closes_at = self
            .timer_minutes
            .map(|minutes| now + Duration::minutes(minutes as i64));
    }

    pub fn total_votes(&self) -> u64 {
        self.voted.len() as u64
    }
}

// ============================================================================
// Room Interior
// ============================================================================

/// Mutable room state guarded by the room mutex
#[derive(Debug, Default)]
pub(crate) struct RoomInner {
    pub participants: Vec<Participant>,
    pub polls: Vec<Poll>,
    /// Armed auto-stop tasks keyed by poll id
    pub timers: HashMap<Uuid, JoinHandle<()>>,
    /// Latched once a report snapshot has been produced; wipe requires it
    pub report_generated: bool,
}

impl RoomInner {
    pub fn poll_mut(&mut self, poll_id: Uuid) -> Result<&mut Poll, PollError> {
        self.polls
            .iter_mut()
            .find(|poll| poll.poll_id == poll_id)
            .ok_or(PollError::NotFound("Poll"))
    }

    pub fn participant_mut(&mut self, participant_id: Uuid) -> Result<&mut Participant, PollError> {
        self.participants
            .iter_mut()
            .find(|p| p.participant_id == participant_id)
            .ok_or(PollError::NotFound("Participant"))
    }

    /// (total, approved, pending) admission counts
    pub fn admission_counts(&self) -> (usize, usize, usize) {
        let total = self.participants.len();
        let approved = self
            .participants
            .iter()
            .filter(|p| p.approval_status == ApprovalStatus::Approved)
            .count();
        let pending = self
            .participants
            .iter()
            .filter(|p| p.approval_status == ApprovalStatus::Pending)
            .count();
        (total, approved, pending)
    }
}

// ============================================================================
// Room
// ============================================================================

/// One polling session, identified by a short code
pub struct Room {
    /// Normalized (uppercase) room code
    pub room_id: String,
    pub organizer_name: String,
    pub created_at: DateTime<Utc>,

    /// All mutable state; the per-room serialization point
    pub(crate) inner: Mutex<RoomInner>,

    /// Fan-out channel for room events
    events_tx: broadcast::Sender<Envelope>,
}

impl Room {
    pub(crate) fn new(room_id: String, organizer_name: String) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            room_id,
            organizer_name,
            created_at: Utc::now(),
            inner: Mutex::new(RoomInner::default()),
            events_tx,
        }
    }

    // ========================================================================
    // Broadcasting
    // ========================================================================

    /// Subscribe to this room's event stream
    ///
    /// Subscribing and dropping the receiver never affect room state.
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.events_tx.subscribe()
    }

    /// Number of live subscriptions
    pub fn connection_count(&self) -> usize {
        self.events_tx.receiver_count()
    }

    /// Send an envelope to every subscriber; fire-and-forget
    ///
    /// Called while the room lock is held so that delivery order matches
    /// mutation order. `broadcast::Sender::send` is synchronous and never
    /// blocks on slow receivers.
    pub(crate) fn send(&self, envelope: Envelope) {
        let _ = self.events_tx.send(envelope);
    }

    // ========================================================================
    // Status
    // ========================================================================

    /// Snapshot of admission counts and active polls
    pub async fn status(&self) -> RoomStatusResponse {
        let inner = self.inner.lock().await;
        let (participant_count, approved_count, pending_count) = inner.admission_counts();

        let active_polls: Vec<ActivePollInfo> = inner
            .polls
            .iter()
            .filter(|poll| poll.state.is_active())
            .map(|poll| ActivePollInfo {
                poll_id: poll.poll_id,
                question: poll.question.clone(),
                options: poll.options.clone(),
                is_active: true,
            })
            .collect();

        RoomStatusResponse {
            room_id: self.room_id.clone(),
            organizer_name: self.organizer_name.clone(),
            participant_count,
            approved_count,
            pending_count,
            total_polls: inner.polls.len(),
            active_poll_count: active_polls.len(),
            active_polls,
        }
    }
}
