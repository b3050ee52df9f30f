use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

type LockMap = HashMap<String, Arc<AsyncMutex<()>>>;

/// One async mutex per room. Every mutation of a room runs while holding its
/// guard, so the two players' requests never interleave inside a room while
/// different rooms proceed independently.
///
/// A room's mutex only lives in the map while someone holds or waits for it.
#[derive(Debug, Clone, Default)]
pub struct RoomLocks {
    locks: Arc<Mutex<LockMap>>,
}

/// Exclusive access to one room. Dropping it releases the room and evicts
/// its mutex when nobody else is queued on it.
#[derive(Debug)]
pub struct RoomGuard {
    room_id: String,
    locks: Arc<Mutex<LockMap>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl RoomLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to a room
    pub async fn acquire(&self, room_id: &str) -> RoomGuard {
        let lock = {
            let mut locks = lock_map(&self.locks);
            locks
                .entry(room_id.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        debug!(room_id = %room_id, "Waiting for room lock");
        let guard = lock.lock_owned().await;
        RoomGuard {
            room_id: room_id.to_string(),
            locks: Arc::clone(&self.locks),
            guard: Some(guard),
        }
    }

    /// Number of rooms currently held or waited on
    pub fn len(&self) -> usize {
        lock_map(&self.locks).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for RoomGuard {
    fn drop(&mut self) {
        // the owned guard keeps its own handle on the mutex, release it first
        drop(self.guard.take());

        let mut locks = lock_map(&self.locks);
        // clones are only handed out under the map lock, so a count of one
        // means no task holds or waits for this room
        let idle = locks
            .get(&self.room_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if idle {
            locks.remove(&self.room_id);
            debug!(room_id = %self.room_id, "Evicted idle room lock");
        }
    }
}

// the map only holds Arcs, a poisoned guard still has a usable map
fn lock_map(locks: &Mutex<LockMap>) -> std::sync::MutexGuard<'_, LockMap> {
    locks
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
