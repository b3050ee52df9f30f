use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Slice of room state a subscriber should re-fetch
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TableCategory {
    Rack,
    Board,
    Bag,
    Room,
    Players,
}

/// Events pushed to everyone subscribed to a room
///
/// Events carry no game data: they only tell clients which parts of the
/// room changed so they can reload them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomEvent {
    /// A mutation was committed
    StateChanged {
        room_id: String,
        categories: Vec<TableCategory>,
    },
}

impl RoomEvent {
    pub fn state_changed(room_id: &str, categories: &[TableCategory]) -> Self {
        let mut categories = categories.to_vec();
        categories.sort();
        categories.dedup();
        RoomEvent::StateChanged {
            room_id: room_id.to_string(),
            categories,
        }
    }

    pub fn room_id(&self) -> &str {
        match self {
            RoomEvent::StateChanged { room_id, .. } => room_id,
        }
    }
}
