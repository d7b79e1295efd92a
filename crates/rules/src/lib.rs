//! Rule evaluation and frame-gating engine.
//!
//! This crate provides:
//! - `RuleEvaluator` matching a detection against global and detector rules
//! - `FrameCounter` tracking sustained presence of labels per identifier
//! - `Dispatcher` turning the ordered matches into log/report requests
//! - `RuleEngine` tying the three together for one event at a time

pub mod clock;
pub mod dispatcher;
pub mod engine;
pub mod evaluator;
pub mod frame_counter;

pub use clock::WeekTime;
pub use dispatcher::{ActionSink, DispatchOutcome, Dispatcher};
pub use engine::RuleEngine;
pub use evaluator::RuleEvaluator;
pub use frame_counter::FrameCounter;
