//! Per-rule predicates. Each returns `true` when its field is unset.

use watchpost_core::config::{Rule, Timeframe};
use watchpost_core::event::DetectionEvent;

use crate::clock::WeekTime;

/// A rule matches only when every predicate passes.
pub(super) fn rule_matches(rule: &Rule, event: &DetectionEvent, now: WeekTime) -> bool {
    label_matches(rule, event)
        && below_matches(rule, event)
        && above_matches(rule, event)
        && region_matches(rule, event)
        && timeframe_matches(rule, now)
}

fn label_matches(rule: &Rule, event: &DetectionEvent) -> bool {
    match &rule.labels {
        Some(labels) => labels.iter().any(|l| *l == event.label),
        None => true,
    }
}

fn below_matches(rule: &Rule, event: &DetectionEvent) -> bool {
    match rule.confidence_below {
        Some(bound) => event.confidence < bound,
        None => true,
    }
}

fn above_matches(rule: &Rule, event: &DetectionEvent) -> bool {
    match rule.confidence_above {
        Some(bound) => event.confidence > bound,
        None => true,
    }
}

/// Containment, not overlap: the detection must sit inside the rule region.
fn region_matches(rule: &Rule, event: &DetectionEvent) -> bool {
    match &rule.bounding_box {
        Some(region) => region.contains(&event.bounding_box),
        None => true,
    }
}

fn timeframe_matches(rule: &Rule, now: WeekTime) -> bool {
    match &rule.timeframe {
        Some(windows) => windows.iter().any(|w| window_active(w, now)),
        None => true,
    }
}

/// Inclusive on both ends. Components missing on either side are skipped.
pub(super) fn window_active(window: &Timeframe, now: WeekTime) -> bool {
    let within = |from: Option<u32>, to: Option<u32>, value: u32| match (from, to) {
        (Some(lo), Some(hi)) => value >= lo && value <= hi,
        _ => true,
    };

    within(window.from.day_of_week, window.to.day_of_week, now.day_of_week)
        && within(window.from.hour, window.to.hour, now.hour)
        && within(window.from.minute, window.to.minute, now.minute)
}
