use async_trait::async_trait;
use chrono::{DateTime, Utc};

use watchpost_core::event::DetectionEvent;

use crate::error::StorageError;

/// Destination for events matched by a `log` rule.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist one event, stamped with the current time.
    async fn log_event(&self, event: &DetectionEvent) -> Result<(), StorageError>;

    /// Delete events created before `cutoff`. Returns the number removed.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StorageError>;

    /// Backend name for logging (e.g. "mysql").
    fn backend_name(&self) -> &str;
}
