//! Per-event processing: tick the frame counter, match, gate, dispatch.

use std::sync::Arc;

use tracing::debug;

use watchpost_core::config::{Config, Rule};
use watchpost_core::event::DetectionEvent;

use crate::clock::WeekTime;
use crate::dispatcher::{ActionSink, DispatchOutcome, Dispatcher};
use crate::evaluator::RuleEvaluator;
use crate::frame_counter::FrameCounter;

/// Owns the frame counter and a shared, read-only config.
///
/// Events must be fed one at a time; `process` takes `&mut self` so the
/// frame counter's read-modify-write sweep never interleaves.
pub struct RuleEngine {
    config: Arc<Config>,
    frames: FrameCounter,
}

impl RuleEngine {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            frames: FrameCounter::new(),
        }
    }

    pub fn frames(&self) -> &FrameCounter {
        &self.frames
    }

    /// Process `event` against the current local time.
    pub fn process(&mut self, event: &DetectionEvent, sink: &dyn ActionSink) -> DispatchOutcome {
        self.process_at(event, WeekTime::now(), sink)
    }

    pub fn process_at(
        &mut self,
        event: &DetectionEvent,
        now: WeekTime,
        sink: &dyn ActionSink,
    ) -> DispatchOutcome {
        self.frames.tick(&event.identifier, &[event.label.as_str()]);
        let frame_count = self.frames.frame_count(&event.identifier, &event.label);

        debug!(
            identifier = %event.identifier,
            label = %event.label,
            confidence = event.confidence,
            frame_count,
            tracked = self.frames.len(),
            "received detection"
        );

        let mut matched = RuleEvaluator::match_rules(event, &self.config, now);

        if self.config.enforce_min_frame_count {
            matched.retain(|rule| sustained(rule, frame_count));
        }

        Dispatcher::dispatch(event, &matched, sink)
    }
}

/// Frame gate for a matched rule; rules without `minFrameCount` always pass.
fn sustained(rule: &Rule, frame_count: u32) -> bool {
    match rule.min_frame_count {
        Some(min) => frame_count >= min,
        None => true,
    }
}
