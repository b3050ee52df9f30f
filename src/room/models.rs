use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::game::{BoundsPolicy, PlayerId};

/// Seats in a room
pub const MAX_PLAYERS: usize = 2;

/// Lifecycle of a room: waiting -> active -> finished, never backwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RoomState {
    Waiting,
    Active,
    Finished,
}

/// A room record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomModel {
    pub id: String, // Random pet name, also seeds the room's bag
    pub owner_id: PlayerId,
    pub state: RoomState,
    pub player_ids: Vec<PlayerId>, // Seat order, owner first
    pub bounds_policy: BoundsPolicy,
    pub created_at: DateTime<Utc>,
}

impl RoomModel {
    /// Creates a waiting room with a generated id and the owner in seat 1
    pub fn new(owner_id: PlayerId, bounds_policy: BoundsPolicy) -> Self {
        let room_id = petname::Petnames::default().generate_one(2, "-");
        Self::with_id(room_id, owner_id, bounds_policy)
    }

    pub fn with_id(id: String, owner_id: PlayerId, bounds_policy: BoundsPolicy) -> Self {
        Self {
            id,
            player_ids: vec![owner_id.clone()],
            owner_id,
            state: RoomState::Waiting,
            bounds_policy,
            created_at: Utc::now(),
        }
    }

    pub fn player_count(&self) -> usize {
        self.player_ids.len()
    }

    pub fn is_full(&self) -> bool {
        self.player_ids.len() >= MAX_PLAYERS
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.player_ids.iter().any(|p| p == player_id)
    }

    pub fn is_owner(&self, player_id: &str) -> bool {
        self.owner_id == player_id
    }
}
