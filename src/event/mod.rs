// Room-scoped change notifications
//
// Services report committed mutations through `GameNotifier`; the `EventBus`
// implementation fans them out to websocket subscribers of the room.

// Public API - what other modules can use
pub use bus::EventBus;
pub use events::{RoomEvent, TableCategory};
pub use notifier::{GameNotifier, NoOpNotifier};

// Internal modules
mod bus;
mod events;
mod notifier;
