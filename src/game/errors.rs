use strum_macros::IntoStaticStr;
use thiserror::Error;

use super::tiles::TileSeq;

/// Rule violations reported by the game engine.
///
/// Every engine operation is all-or-nothing: when one of these is returned,
/// no state was changed.
#[derive(Debug, Clone, PartialEq, Eq, Error, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum GameError {
    #[error("Not enough tiles in the bag: requested {requested}, remaining {remaining}")]
    InsufficientTiles { requested: usize, remaining: usize },

    #[error("Tile {seq} has already been drawn")]
    AlreadyDrawn { seq: TileSeq },

    #[error("Tile {seq} is not in the rack")]
    NotInRack { seq: TileSeq },

    #[error("Cell ({x}, {y}) is already occupied")]
    CellOccupied { x: i32, y: i32 },

    #[error("Cell ({x}, {y}) is outside the grid")]
    OutOfBounds { x: i32, y: i32 },

    #[error("Tile {seq} is not on the board")]
    NotOnBoard { seq: TileSeq },

    #[error("Tile {seq} is locked")]
    TileLocked { seq: TileSeq },

    #[error("Game is not active")]
    GameNotActive,

    #[error("Exactly 2 players are required, found {count}")]
    WrongPlayerCount { count: usize },

    #[error("Player is not seated in this room")]
    NotInRoom,

    #[error("Rack must be empty to call MIXMO")]
    RackNotEmpty,

    #[error("Cannot start game: {0}")]
    InvalidStartPrecondition(String),

    #[error("Grid bounds are fixed in this room")]
    FixedBounds,

    #[error("Invalid joker letter: {0}")]
    InvalidLetter(String),

    #[error("Unknown tile {seq}")]
    TileNotFound { seq: TileSeq },

    #[error("Game not found for room: {0}")]
    GameNotFound(String),
}

impl GameError {
    /// Stable machine-readable code, e.g. `rack_not_empty`
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_snake_case() {
        assert_eq!(GameError::RackNotEmpty.kind(), "rack_not_empty");
        assert_eq!(
            GameError::InsufficientTiles {
                requested: 4,
                remaining: 3
            }
            .kind(),
            "insufficient_tiles"
        );
        assert_eq!(GameError::CellOccupied { x: 1, y: 2 }.kind(), "cell_occupied");
    }

    #[test]
    fn test_display_includes_details() {
        let err = GameError::OutOfBounds { x: -1, y: 3 };
        assert_eq!(err.to_string(), "Cell (-1, 3) is outside the grid");
    }
}
