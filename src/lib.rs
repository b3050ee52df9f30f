// Library crate for the Mixmo game server
// This file exposes the public API for integration tests

pub mod config;
pub mod event;
pub mod game;
pub mod room;
pub mod routes;
pub mod session;
pub mod shared;
pub mod websockets;

// Re-export commonly used types for easier access in tests
pub use config::ServerConfig;
pub use event::{EventBus, GameNotifier, RoomEvent, TableCategory};
pub use game::{GameError, GameService, GameSession};
pub use room::{RoomModel, RoomRepository, RoomService, RoomState};
pub use routes::app_router;
pub use shared::{AppError, AppState};
