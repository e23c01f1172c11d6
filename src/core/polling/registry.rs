//! Room registry: creation, lookup, and cross-room indexes
//!
//! Rooms are keyed by a short alphanumeric code, uppercased on the way
//! in so lookups are case-insensitive. Because approve/deny and poll
//! operations address participants and polls by bare id, the registry
//! also maintains id -> room_id indexes, torn down when a room is wiped.

use std::sync::Arc;

use dashmap::DashMap;
use rand::Rng;
use rand::distributions::Alphanumeric;
use uuid::Uuid;

use super::error::PollError;
use super::room::Room;

/// Minimum room code length
pub const ROOM_CODE_MIN_LEN: usize = 3;

/// Maximum room code length
pub const ROOM_CODE_MAX_LEN: usize = 10;

/// Length of generated room codes
const GENERATED_CODE_LEN: usize = 6;

/// Registry of all live rooms
pub struct RoomRegistry {
    /// Live rooms keyed by normalized code
    rooms: DashMap<String, Arc<Room>>,
    /// participant_id -> room code, for organizer approve/deny by id
    pub(crate) participant_rooms: DashMap<Uuid, String>,
    /// poll_id -> room code, for poll operations by id
    pub(crate) poll_rooms: DashMap<Uuid, String>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            participant_rooms: DashMap::new(),
            poll_rooms: DashMap::new(),
        }
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Create a room with a custom or generated code
    ///
    /// Custom codes are trimmed, validated (3-10 alphanumeric characters)
    /// and uppercased; a taken code fails with `DuplicateRoomId`.
    /// Generated codes retry until they land on a free slot.
    pub fn create_room(
        &self,
        organizer_name: String,
        custom_room_id: Option<String>,
    ) -> Result<Arc<Room>, PollError> {
        let room_id = match custom_room_id.as_deref().map(str::trim) {
            Some(custom) if !custom.is_empty() => {
                let code = validate_room_code(custom)?;
                if self.rooms.contains_key(&code) {
                    return Err(PollError::DuplicateRoomId);
                }
                code
            }
            _ => loop {
                let code = generate_room_code();
                if !self.rooms.contains_key(&code) {
                    break code;
                }
            },
        };

        let room = Arc::new(Room::new(room_id.clone(), organizer_name));

        // A generated code can race another create for the same code; the
        // entry API makes the insert the deciding step.
        match self.rooms.entry(room_id) {
            dashmap::Entry::Occupied(_) => Err(PollError::DuplicateRoomId),
            dashmap::Entry::Vacant(entry) => {
                entry.insert(room.clone());
                tracing::info!(
                    room_id = %room.room_id,
                    organizer = %room.organizer_name,
                    "room created"
                );
                Ok(room)
            }
        }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Get a live room by code (case-insensitive)
    pub fn get_room(&self, room_id: &str) -> Result<Arc<Room>, PollError> {
        let code = normalize_room_code(room_id);
        self.rooms
            .get(&code)
            .map(|entry| entry.clone())
            .ok_or(PollError::NotFound("Room"))
    }

    /// Resolve the room holding a participant
    pub fn room_for_participant(&self, participant_id: Uuid) -> Result<Arc<Room>, PollError> {
        let code = self
            .participant_rooms
            .get(&participant_id)
            .map(|entry| entry.clone())
            .ok_or(PollError::NotFound("Participant"))?;
        self.get_room(&code)
    }

    /// Resolve the room holding a poll
    pub fn room_for_poll(&self, poll_id: Uuid) -> Result<Arc<Room>, PollError> {
        let code = self
            .poll_rooms
            .get(&poll_id)
            .map(|entry| entry.clone())
            .ok_or(PollError::NotFound("Poll"))?;
        self.get_room(&code)
    }

    /// Number of live rooms
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Remove a room from the registry; callers handle cascade cleanup
    pub(crate) fn remove_room(&self, room_id: &str) -> Option<Arc<Room>> {
        self.rooms.remove(room_id).map(|(_, room)| room)
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Room Codes
// ============================================================================

/// Uppercase a room code for case-insensitive matching
pub fn normalize_room_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Validate and normalize a custom room code
fn validate_room_code(code: &str) -> Result<String, PollError> {
    if code.len() < ROOM_CODE_MIN_LEN || code.len() > ROOM_CODE_MAX_LEN {
        return Err(PollError::InvalidInput(format!(
            "room code must be {}-{} characters long",
            ROOM_CODE_MIN_LEN, ROOM_CODE_MAX_LEN
        )));
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(PollError::InvalidInput(
            "room code must contain only letters and numbers".to_string(),
        ));
    }

    Ok(normalize_room_code(code))
}

/// Random uppercase alphanumeric room code
fn generate_room_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_CODE_LEN)
        .map(char::from)
        .collect::<String>()
        .to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_room_with_generated_code() {
        let registry = RoomRegistry::new();
        let room = registry.create_room("Alice".to_string(), None).unwrap();

        assert_eq!(room.room_id.len(), GENERATED_CODE_LEN);
        assert!(room.room_id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(room.room_id, room.room_id.to_ascii_uppercase());
        assert_eq!(registry.room_count(), 1);
    }

    #[test]
    fn test_create_room_with_custom_code_normalizes_case() {
        let registry = RoomRegistry::new();
        let room = registry
            .create_room("Alice".to_string(), Some("abc123".to_string()))
            .unwrap();

        assert_eq!(room.room_id, "ABC123");
        assert!(registry.get_room("abc123").is_ok());
        assert!(registry.get_room("ABC123").is_ok());
    }

    #[test]
    fn test_custom_code_below_minimum_fails() {
        let registry = RoomRegistry::new();
        let result = registry.create_room("Alice".to_string(), Some("AB".to_string()));

        assert!(matches!(result, Err(PollError::InvalidInput(_))));
        assert_eq!(registry.room_count(), 0);
    }

    #[test]
    fn test_custom_code_above_maximum_fails() {
        let registry = RoomRegistry::new();
        let result = registry.create_room("Alice".to_string(), Some("ABCDEFGHIJK".to_string()));

        assert!(matches!(result, Err(PollError::InvalidInput(_))));
    }

    #[test]
    fn test_custom_code_with_symbols_fails() {
        let registry = RoomRegistry::new();
        let result = registry.create_room("Alice".to_string(), Some("AB-123".to_string()));

        assert!(matches!(result, Err(PollError::InvalidInput(_))));
    }

    #[test]
    fn test_duplicate_custom_code_fails() {
        let registry = RoomRegistry::new();
        registry
            .create_room("Alice".to_string(), Some("MEET42".to_string()))
            .unwrap();

        let result = registry.create_room("Eve".to_string(), Some("meet42".to_string()));
        assert!(matches!(result, Err(PollError::DuplicateRoomId)));
    }

    #[test]
    fn test_blank_custom_code_falls_back_to_generated() {
        let registry = RoomRegistry::new();
        let room = registry
            .create_room("Alice".to_string(), Some("   ".to_string()))
            .unwrap();

        assert_eq!(room.room_id.len(), GENERATED_CODE_LEN);
    }

    #[test]
    fn test_get_unknown_room_fails_not_found() {
        let registry = RoomRegistry::new();
        assert!(matches!(
            registry.get_room("NOPE42"),
            Err(PollError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_room() {
        let registry = RoomRegistry::new();
        let room = registry
            .create_room("Alice".to_string(), Some("GONE99".to_string()))
            .unwrap();

        let removed = registry.remove_room(&room.room_id);
        assert!(removed.is_some());
        assert!(registry.get_room("GONE99").is_err());
    }
}
