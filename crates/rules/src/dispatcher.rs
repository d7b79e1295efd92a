//! Turns an ordered match list into log/report requests.
//!
//! Walks the matches in priority order. `log` and `report` hand the event
//! to the [`ActionSink`] and continue; `ignore` stops the walk. The sink is
//! expected to return immediately (fire-and-forget), so a slow database or
//! webhook never holds up the next event.

use serde::Serialize;
use tracing::debug;

use watchpost_core::config::{Rule, RuleAction};
use watchpost_core::event::DetectionEvent;

/// Receiver of the side effects chosen by the dispatcher.
///
/// Implementations must not block; failures are theirs to log.
pub trait ActionSink {
    /// Persist the event.
    fn log_event(&self, event: &DetectionEvent);

    /// Send a notification for the event.
    fn report_event(&self, event: &DetectionEvent);
}

/// What the dispatcher did for one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub matched: usize,
    pub logged: usize,
    pub reported: usize,
    /// Whether an `ignore` rule ended the walk.
    pub ignored: bool,
}

impl DispatchOutcome {
    /// True when no side effect was requested.
    pub fn is_noop(&self) -> bool {
        self.logged == 0 && self.reported == 0
    }
}

pub struct Dispatcher;

impl Dispatcher {
    /// Apply `matches` (already priority-sorted) to `event`.
    pub fn dispatch(
        event: &DetectionEvent,
        matches: &[&Rule],
        sink: &dyn ActionSink,
    ) -> DispatchOutcome {
        let mut outcome = DispatchOutcome {
            matched: matches.len(),
            ..Default::default()
        };

        if matches.is_empty() {
            debug!(identifier = %event.identifier, "no rules matched");
            return outcome;
        }

        for rule in matches {
            match rule.action {
                RuleAction::Ignore => {
                    debug!(identifier = %event.identifier, label = %event.label, "ignoring event");
                    outcome.ignored = true;
                    break;
                }
                RuleAction::Log => {
                    debug!(identifier = %event.identifier, label = %event.label, "logging event");
                    sink.log_event(event);
                    outcome.logged += 1;
                }
                RuleAction::Report => {
                    debug!(identifier = %event.identifier, label = %event.label, "reporting event");
                    sink.report_event(event);
                    outcome.reported += 1;
                }
            }
        }

        outcome
    }
}
