pub mod consumer;
pub mod error;
pub mod memory;
pub mod mqtt;
pub mod parser;

pub use consumer::{QueueConsumer, QueueMessage};
pub use error::QueueError;
pub use memory::ChannelConsumer;
pub use mqtt::MqttConsumer;
pub use parser::{parse_event, parse_message};
