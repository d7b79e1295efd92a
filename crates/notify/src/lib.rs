//! Notification delivery for reported detections.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable notification channels
//! - A Gotify-style webhook notifier
//! - Minijinja rendering of notification titles and messages
//! - Dispatcher fanning one notification out to every channel
//! - `EventReporter` turning a detection into a delivered notification

pub mod dispatcher;
pub mod reporter;
pub mod templating;
pub mod traits;
pub mod webhook;

pub use dispatcher::Dispatcher;
pub use reporter::EventReporter;
pub use traits::{Notification, Notifier, NotifyError};
