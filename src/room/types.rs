use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{RoomModel, RoomState};
use crate::game::BoundsPolicy;

/// Request payload for creating a new room
#[derive(Debug, Default, Deserialize)]
pub struct RoomCreateRequest {
    /// Friend to seat next to the owner right away
    #[serde(default)]
    pub opponent_id: Option<String>,
    /// Overrides the server's default grid policy
    #[serde(default)]
    pub bounds_policy: Option<BoundsPolicy>,
}

/// Response for room creation and room information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomResponse {
    pub id: String,
    pub owner_id: String,
    pub state: RoomState,
    pub player_ids: Vec<String>,
    pub player_count: usize,
    pub bounds_policy: BoundsPolicy,
    pub created_at: DateTime<Utc>,
}

impl From<RoomModel> for RoomResponse {
    fn from(room: RoomModel) -> Self {
        Self {
            player_count: room.player_count(),
            id: room.id,
            owner_id: room.owner_id,
            state: room.state,
            player_ids: room.player_ids,
            bounds_policy: room.bounds_policy,
            created_at: room.created_at,
        }
    }
}
