//! MQTT detection consumer: wires the queue, rule engine, store and
//! reporter into one long-running service.

pub mod cli;
pub mod service;
pub mod sink;

pub use cli::Cli;
pub use service::{run, RunStats};
pub use sink::SpawningSink;
