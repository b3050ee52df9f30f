use serde::{Deserialize, Serialize};

use super::board::GridBounds;
use super::state::{BoardTile, RackTile};
use super::tiles::TileSeq;
use super::words::{PlacedLetter, Word};
use crate::room::models::RoomState;

/// Everything one player is allowed to see of a room's game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub room_id: String,
    pub player_id: String,
    pub state: RoomState,
    pub rack: Vec<RackTile>,
    pub board: Vec<BoardTile>,
    pub bounds: GridBounds,
    pub bag_count: usize,
    pub mixmo_enabled: bool,
    pub opponent: Option<OpponentView>,
}

/// Public counts of the other player; their tiles stay private
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentView {
    pub player_id: String,
    pub rack_count: usize,
    pub board_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct PlaceTileRequest {
    pub seq: TileSeq,
    pub x: i32,
    pub y: i32,
    /// Letter a joker stands for
    #[serde(default)]
    pub as_letter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MoveTileRequest {
    pub seq: TileSeq,
    pub x: i32,
    pub y: i32,
}

/// Request naming a single tile
#[derive(Debug, Deserialize)]
pub struct TileRequest {
    pub seq: TileSeq,
}

#[derive(Debug, Deserialize)]
pub struct ExtractWordsRequest {
    pub tiles: Vec<PlacedLetter>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WordsResponse {
    pub words: Vec<Word>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecallResponse {
    pub recalled: Vec<TileSeq>,
    pub view: PlayerView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BagCountResponse {
    pub room_id: String,
    pub remaining: usize,
}
