pub mod config;
pub mod error;
pub mod event;
pub mod validation;

pub use config::Config;
pub use error::*;
pub use event::*;
