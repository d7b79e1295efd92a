//! In-process consumer backed by a tokio channel.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::consumer::{QueueConsumer, QueueMessage};
use crate::error::QueueError;

/// Consumer fed through an [`mpsc::Sender`]. Closes when every sender is dropped.
pub struct ChannelConsumer {
    rx: mpsc::Receiver<QueueMessage>,
}

impl ChannelConsumer {
    /// Create a consumer and the sender that feeds it.
    pub fn new(buffer: usize) -> (mpsc::Sender<QueueMessage>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self { rx })
    }
}

#[async_trait]
impl QueueConsumer for ChannelConsumer {
    async fn recv(&mut self) -> Result<Option<QueueMessage>, QueueError> {
        Ok(self.rx.recv().await)
    }

    fn provider(&self) -> &str {
        "channel"
    }
}
