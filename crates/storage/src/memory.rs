use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use watchpost_core::event::DetectionEvent;

use crate::error::StorageError;
use crate::store::EventStore;

#[derive(Debug, Clone)]
pub struct StoredEvent {
    pub event: DetectionEvent,
    pub created_at: DateTime<Utc>,
}

/// Process-local event store. Clones share the same records.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    events: Arc<Mutex<Vec<StoredEvent>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert with an explicit creation time.
    pub async fn insert_at(&self, event: DetectionEvent, created_at: DateTime<Utc>) {
        self.events.lock().await.push(StoredEvent { event, created_at });
    }

    pub async fn events(&self) -> Vec<DetectionEvent> {
        self.events
            .lock()
            .await
            .iter()
            .map(|s| s.event.clone())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.events.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.lock().await.is_empty()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn log_event(&self, event: &DetectionEvent) -> Result<(), StorageError> {
        self.insert_at(event.clone(), Utc::now()).await;
        Ok(())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError> {
        let mut events = self.events.lock().await;
        let before = events.len();
        events.retain(|s| s.created_at >= cutoff);
        Ok((before - events.len()) as u64)
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
