// Public API
pub use handler::{websocket_handler, WsAuthQuery};
pub use socket::{Connection, SocketError, SocketWrapper};

// Internal modules
mod handler;
mod socket;
