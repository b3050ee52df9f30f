use async_trait::async_trait;
use tracing::debug;

use super::bus::EventBus;
use super::events::{RoomEvent, TableCategory};

/// Receives one signal per committed room mutation
#[async_trait]
pub trait GameNotifier: Send + Sync {
    async fn notify(&self, room_id: &str, categories: &[TableCategory]);
}

#[async_trait]
impl GameNotifier for EventBus {
    async fn notify(&self, room_id: &str, categories: &[TableCategory]) {
        debug!(room_id = %room_id, categories = ?categories, "Notifying room subscribers");
        self.emit_to_room(room_id, RoomEvent::state_changed(room_id, categories))
            .await;
    }
}

/// Notifier that drops every signal
pub struct NoOpNotifier;

#[async_trait]
impl GameNotifier for NoOpNotifier {
    async fn notify(&self, _room_id: &str, _categories: &[TableCategory]) {}
}
