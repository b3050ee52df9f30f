use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::StreamExt;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::event::{RoomEvent, TableCategory};

/// Simple WebSocket abstraction - all we care about is send/receive
#[async_trait]
pub trait SocketWrapper: Send {
    /// Send a text message to the client
    async fn send_message(&mut self, message: String) -> Result<(), SocketError>;

    /// Receive the next message from the client (None if connection closed)
    async fn receive_message(&mut self) -> Result<Option<String>, SocketError>;

    /// Close the connection
    async fn close(&mut self) -> Result<(), SocketError>;
}

#[derive(Debug)]
pub enum SocketError {
    SendFailed(String),
    ReceiveFailed(String),
}

/// Direct implementation on axum's WebSocket
#[async_trait]
impl SocketWrapper for WebSocket {
    async fn send_message(&mut self, message: String) -> Result<(), SocketError> {
        self.send(Message::Text(message))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }

    async fn receive_message(&mut self) -> Result<Option<String>, SocketError> {
        loop {
            match self.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // binary/ping/pong
                Some(Err(e)) => return Err(SocketError::ReceiveFailed(e.to_string())),
            }
        }
    }

    async fn close(&mut self) -> Result<(), SocketError> {
        self.send(Message::Close(None))
            .await
            .map_err(|e| SocketError::SendFailed(e.to_string()))
    }
}

/// A subscriber's connection: room events go out as JSON text frames.
/// Clients only listen, anything they send is ignored.
pub struct Connection {
    pub player_id: String,
    pub room_id: String,
    socket: Box<dyn SocketWrapper>,
    events: broadcast::Receiver<RoomEvent>,
}

impl Connection {
    pub fn new(
        player_id: String,
        room_id: String,
        socket: Box<dyn SocketWrapper>,
        events: broadcast::Receiver<RoomEvent>,
    ) -> Self {
        Self {
            player_id,
            room_id,
            socket,
            events,
        }
    }

    /// Run the connection until the client leaves or the room channel closes
    pub async fn run(mut self) -> Result<(), SocketError> {
        loop {
            tokio::select! {
                event = self.events.recv() => {
                    let event = match event {
                        Ok(event) => event,
                        Err(RecvError::Lagged(skipped)) => {
                            // missed signals: ask the client to reload everything
                            warn!(room_id = %self.room_id, player_id = %self.player_id, skipped, "Subscriber lagged");
                            RoomEvent::state_changed(
                                &self.room_id,
                                &[
                                    TableCategory::Rack,
                                    TableCategory::Board,
                                    TableCategory::Bag,
                                    TableCategory::Room,
                                    TableCategory::Players,
                                ],
                            )
                        }
                        Err(RecvError::Closed) => break,
                    };

                    debug!(room_id = %event.room_id(), player_id = %self.player_id, "Forwarding room event");
                    match serde_json::to_string(&event) {
                        Ok(json) => self.socket.send_message(json).await?,
                        Err(e) => warn!(error = %e, "Failed to serialize room event"),
                    }
                }

                msg = self.socket.receive_message() => {
                    match msg {
                        Ok(Some(message)) => {
                            debug!(room_id = %self.room_id, player_id = %self.player_id, message = %message, "Ignoring client message");
                        }
                        Ok(None) => break,
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        let _ = self.socket.close().await;
        Ok(())
    }
}
