//! Rule matching for a single detection event.
//!
//! Candidates are the global rules followed by the rules of the detector
//! whose identifier equals the event's. Every candidate is checked with
//! the predicates in [`predicates`]; the survivors are returned in
//! descending priority order.

mod predicates;

use std::cmp::Reverse;

use watchpost_core::config::{Config, Rule};
use watchpost_core::event::DetectionEvent;

use crate::clock::WeekTime;

use predicates::rule_matches;

// ── Rule evaluator ──────────────────────────────────────────────────

/// Matches events against a [`Config`].
pub struct RuleEvaluator;

impl RuleEvaluator {
    /// Return every rule that matches `event` at `now`, highest priority first.
    ///
    /// The sort is stable: rules sharing a priority keep their scan order
    /// (global rules in declaration order, then detector rules in
    /// declaration order). A missing priority counts as `1`.
    pub fn match_rules<'c>(
        event: &DetectionEvent,
        config: &'c Config,
        now: WeekTime,
    ) -> Vec<&'c Rule> {
        let candidates = config
            .global_rules
            .iter()
            .chain(config.detector_rules(&event.identifier));

        let mut matched: Vec<&Rule> = candidates
            .filter(|rule| rule_matches(rule, event, now))
            .collect();

        matched.sort_by_key(|rule| Reverse(rule.priority()));
        matched
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use watchpost_core::config::RuleAction;
    use watchpost_core::event::BoundingBox;

    const NOW: WeekTime = WeekTime {
        day_of_week: 2,
        hour: 14,
        minute: 0,
    };

    fn config(json: serde_json::Value) -> Config {
        let mut base = serde_json::json!({
            "debug": false,
            "retainLogsForDays": 1,
            "mqtt": { "host": "mqtt://localhost" },
            "db": { "host": "h", "user": "u", "password": "p", "database": "d" },
            "globalRules": [],
            "detectors": []
        });
        for (k, v) in json.as_object().unwrap() {
            base[k] = v.clone();
        }
        Config::from_value(base).unwrap().config
    }

    fn event(identifier: &str, label: &str, confidence: f64) -> DetectionEvent {
        DetectionEvent::new(
            identifier,
            label,
            confidence,
            BoundingBox::new([10.0, 10.0], [20.0, 20.0]),
        )
    }

    /// Tag rules by priority so assertions can read the output order.
    fn priorities(rules: &[&Rule]) -> Vec<Option<i64>> {
        rules.iter().map(|r| r.priority).collect()
    }

    #[test]
    fn global_rules_apply_without_detector() {
        let cfg = config(serde_json::json!({
            "globalRules": [ { "action": "log" } ]
        }));
        let matched = RuleEvaluator::match_rules(&event("unknown", "person", 0.9), &cfg, NOW);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].action, RuleAction::Log);
    }

    #[test]
    fn other_detectors_are_not_considered() {
        let cfg = config(serde_json::json!({
            "detectors": [
                { "identifier": "cam/a", "rules": [ { "action": "log" } ] },
                { "identifier": "cam/b", "rules": [ { "action": "report" } ] }
            ]
        }));
        let matched = RuleEvaluator::match_rules(&event("cam/a", "person", 0.9), &cfg, NOW);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].action, RuleAction::Log);

        assert!(RuleEvaluator::match_rules(&event("cam/c", "person", 0.9), &cfg, NOW).is_empty());
    }

    #[test]
    fn repeated_detector_identifiers_contribute_all_rules() {
        let cfg = config(serde_json::json!({
            "detectors": [
                { "identifier": "cam/a", "rules": [ { "action": "log" } ] },
                { "identifier": "cam/a", "rules": [ { "action": "report", "priority": 1 } ] }
            ]
        }));
        let matched = RuleEvaluator::match_rules(&event("cam/a", "person", 0.9), &cfg, NOW);
        let actions: Vec<_> = matched.iter().map(|r| r.action).collect();
        assert_eq!(actions, vec![RuleAction::Report, RuleAction::Log]);
    }

    #[test]
    fn sorted_by_priority_descending() {
        let cfg = config(serde_json::json!({
            "globalRules": [
                { "action": "log", "priority": 2 },
                { "action": "log" }
            ],
            "detectors": [
                { "identifier": "cam", "rules": [
                    { "action": "report", "priority": 10 },
                    { "action": "ignore", "priority": -5 }
                ] }
            ]
        }));
        let matched = RuleEvaluator::match_rules(&event("cam", "person", 0.9), &cfg, NOW);
        assert_eq!(priorities(&matched), vec![Some(10), Some(2), None, Some(-5)]);
    }

    #[test]
    fn ties_keep_scan_order() {
        let cfg = config(serde_json::json!({
            "globalRules": [
                { "action": "log", "labels": ["g1"] },
                { "action": "report", "priority": 1, "labels": ["g1"] }
            ],
            "detectors": [
                { "identifier": "cam", "rules": [
                    { "action": "ignore", "labels": ["g1"] },
                    { "action": "log", "priority": 1, "labels": ["g1"] }
                ] }
            ]
        }));
        let matched = RuleEvaluator::match_rules(&event("cam", "g1", 0.9), &cfg, NOW);
        let actions: Vec<_> = matched.iter().map(|r| r.action).collect();
        assert_eq!(
            actions,
            vec![RuleAction::Log, RuleAction::Report, RuleAction::Ignore, RuleAction::Log]
        );
        assert_eq!(priorities(&matched), vec![None, Some(1), None, Some(1)]);
    }

    #[test]
    fn non_matching_rules_dropped() {
        let cfg = config(serde_json::json!({
            "globalRules": [
                { "action": "ignore", "confidenceBelow": 0.5 },
                { "action": "log", "labels": ["car"] }
            ],
            "detectors": [
                { "identifier": "cam", "rules": [
                    { "action": "report", "boundingBox": { "topLeft": [0, 0], "bottomRight": [15, 15] } },
                    { "action": "report", "priority": 3, "boundingBox": { "topLeft": [0, 0], "bottomRight": [50, 50] } }
                ] }
            ]
        }));
        let matched = RuleEvaluator::match_rules(&event("cam", "person", 0.7), &cfg, NOW);
        assert_eq!(priorities(&matched), vec![Some(3)]);
    }

    #[test]
    fn time_dependent_only_through_timeframe() {
        let cfg = config(serde_json::json!({
            "globalRules": [
                { "action": "report", "timeframe": [ { "from": { "hour": 22 }, "to": { "hour": 23 } } ] },
                { "action": "log" }
            ]
        }));
        let ev = event("cam", "person", 0.9);
        let day = RuleEvaluator::match_rules(&ev, &cfg, NOW);
        let night = RuleEvaluator::match_rules(&ev, &cfg, WeekTime::new(2, 22, 30));
        assert_eq!(day.len(), 1);
        assert_eq!(night.len(), 2);
        assert_eq!(
            RuleEvaluator::match_rules(&ev, &cfg, NOW),
            day,
            "same instant must yield the same result"
        );
    }
}
