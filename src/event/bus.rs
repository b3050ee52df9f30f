use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use super::events::RoomEvent;

/// Default number of events buffered per room before slow receivers lag
pub const DEFAULT_ROOM_CAPACITY: usize = 100;

/// Event bus for distributing room events to their subscribers
#[derive(Debug, Clone)]
pub struct EventBus {
    /// Room-specific event channels: room_id -> sender
    room_channels: Arc<RwLock<HashMap<String, broadcast::Sender<RoomEvent>>>>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ROOM_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            room_channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// Emits an event to all subscribers of a specific room
    pub async fn emit_to_room(&self, room_id: &str, event: RoomEvent) {
        let room_channels = self.room_channels.read().await;

        match room_channels.get(room_id) {
            Some(sender) => match sender.send(event) {
                Ok(receiver_count) => {
                    debug!(
                        room_id = %room_id,
                        receivers = receiver_count,
                        "Room event emitted"
                    );
                }
                Err(_) => {
                    debug!(room_id = %room_id, "Room event emitted with no receivers");
                }
            },
            // nobody ever subscribed, so nobody can miss it
            None => debug!(room_id = %room_id, "No subscribers for room event"),
        }
    }

    /// Subscribe to events for a specific room
    pub async fn subscribe_to_room(&self, room_id: &str) -> broadcast::Receiver<RoomEvent> {
        {
            let room_channels = self.room_channels.read().await;
            if let Some(sender) = room_channels.get(room_id) {
                return sender.subscribe();
            }
        }

        debug!(room_id = %room_id, "Creating new room channel for subscription");
        let mut room_channels = self.room_channels.write().await;
        room_channels
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Number of live receivers for a room
    pub async fn subscriber_count(&self, room_id: &str) -> usize {
        let room_channels = self.room_channels.read().await;
        room_channels
            .get(room_id)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::events::TableCategory;

    #[tokio::test]
    async fn test_subscribers_receive_room_events() {
        let bus = EventBus::new();
        let mut first = bus.subscribe_to_room("room-1").await;
        let mut second = bus.subscribe_to_room("room-1").await;
        let mut other = bus.subscribe_to_room("room-2").await;

        let event = RoomEvent::state_changed("room-1", &[TableCategory::Board]);
        bus.emit_to_room("room-1", event.clone()).await;

        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
        assert!(other.try_recv().is_err());
        assert_eq!(bus.subscriber_count("room-1").await, 2);
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_is_harmless() {
        let bus = EventBus::new();
        bus.emit_to_room("empty", RoomEvent::state_changed("empty", &[TableCategory::Room]))
            .await;
        assert_eq!(bus.subscriber_count("empty").await, 0);
    }
}
