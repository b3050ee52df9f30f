// Public API
pub use bag::{Bag, BagEntry};
pub use board::{BoundsPolicy, ExpandDirection, GridBounds, Placement};
pub use errors::GameError;
pub use exchange::MixmoOutcome;
pub use models::{GameEventKind, GameEventRecord};
pub use rack::RackEntry;
pub use repository::{GameRepository, InMemoryGameRepository, PostgresGameRepository};
pub use service::GameService;
pub use state::{BoardTile, GameSession, RackTile, INITIAL_RACK_SIZE, MIXMO_TILE_COUNT};
pub use tiles::{fold, PlayerId, Tile, TileSeq, JOKER, LETTER_FREQUENCIES};
pub use types::{OpponentView, PlayerView};
pub use words::{extract, Direction, PlacedLetter, Position, Word};

// Internal modules
mod bag;
mod board;
mod errors;
mod exchange;
pub mod handlers;
mod locks;
mod models;
mod rack;
mod repository;
mod service;
mod state;
mod tiles;
pub mod types;
mod words;
