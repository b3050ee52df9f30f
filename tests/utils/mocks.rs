use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use mixmo::event::{GameNotifier, TableCategory};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Notifier that keeps every signal it receives, in order
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    signals: Arc<RwLock<Vec<(String, Vec<TableCategory>)>>>,
}

#[allow(dead_code)]
impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn signals(&self) -> Vec<(String, Vec<TableCategory>)> {
        self.signals.read().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.signals.read().await.len()
    }

    pub async fn last(&self) -> Option<(String, Vec<TableCategory>)> {
        self.signals.read().await.last().cloned()
    }

    pub async fn clear(&self) {
        self.signals.write().await.clear();
    }
}

#[async_trait]
impl GameNotifier for RecordingNotifier {
    async fn notify(&self, room_id: &str, categories: &[TableCategory]) {
        self.signals
            .write()
            .await
            .push((room_id.to_string(), categories.to_vec()));
    }
}
