//! Queue consumer trait and types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::QueueError;

/// A raw message received from the broker.
#[derive(Debug, Clone, Serialize)]
pub struct QueueMessage {
    /// Topic the message was published on; becomes the event identifier.
    pub topic: String,
    /// Raw message body (expected to be JSON).
    pub payload: Vec<u8>,
    /// When this process received the message.
    pub received_at: DateTime<Utc>,
}

impl QueueMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            received_at: Utc::now(),
        }
    }
}

/// Trait for message sources feeding the rule engine.
///
/// Implementations own their connection handling. Transient failures are
/// retried internally; `recv` only returns `Ok(None)` once the source is
/// closed for good.
#[async_trait]
pub trait QueueConsumer: Send {
    /// Wait for the next message.
    async fn recv(&mut self) -> Result<Option<QueueMessage>, QueueError>;

    /// Provider name for logging (e.g. "mqtt").
    fn provider(&self) -> &str;
}
