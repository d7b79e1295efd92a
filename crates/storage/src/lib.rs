//! Persistence for logged detection events.
//!
//! - `EventStore` trait implemented by the MySQL store and an in-memory store
//! - Background retention task purging records past `retainLogsForDays`

pub mod error;
pub mod memory;
pub mod mysql;
pub mod retention;
pub mod store;

pub use error::StorageError;
pub use memory::InMemoryEventStore;
pub use mysql::MySqlEventStore;
pub use retention::{purge_expired, spawn_retention_task};
pub use store::EventStore;
