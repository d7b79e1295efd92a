//! Sustained-presence counter per `(identifier, label)`.
//!
//! Each tick grows the count of every observed label by one (capped at
//! [`MAX_FRAME_COUNT`]) and shrinks every other tracked label of the same
//! identifier by one. Entries that reach zero are removed, so the map only
//! holds labels seen recently.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Upper bound for any frame count.
pub const MAX_FRAME_COUNT: u32 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FrameKey {
    identifier: String,
    label: String,
}

/// State tracked for one `(identifier, label)` pair.
#[derive(Debug, Clone, Serialize)]
pub struct FrameCountEntry {
    /// Always in `1..=MAX_FRAME_COUNT` while the entry exists.
    pub frame_count: u32,
    /// Last tick at which the label was observed.
    pub last_seen: DateTime<Utc>,
}

/// In-memory frame counter. Owned by a single engine; not shared.
#[derive(Debug, Default)]
pub struct FrameCounter {
    entries: HashMap<FrameKey, FrameCountEntry>,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one tick for `identifier` having observed `labels`.
    pub fn tick<S: AsRef<str>>(&mut self, identifier: &str, labels: &[S]) {
        self.tick_at(identifier, labels, Utc::now());
    }

    /// [`tick`](Self::tick) with an explicit observation time.
    pub fn tick_at<S: AsRef<str>>(&mut self, identifier: &str, labels: &[S], at: DateTime<Utc>) {
        for label in labels {
            let key = FrameKey {
                identifier: identifier.to_string(),
                label: label.as_ref().to_string(),
            };
            let entry = self.entries.entry(key).or_insert(FrameCountEntry {
                frame_count: 0,
                last_seen: at,
            });
            entry.frame_count = (entry.frame_count + 1).min(MAX_FRAME_COUNT);
            entry.last_seen = at;
        }

        self.entries.retain(|key, entry| {
            if key.identifier != identifier || labels.iter().any(|l| l.as_ref() == key.label) {
                return true;
            }
            entry.frame_count = entry.frame_count.saturating_sub(1);
            entry.frame_count > 0
        });
    }

    /// Current count for the pair, `0` when untracked.
    pub fn frame_count(&self, identifier: &str, label: &str) -> u32 {
        self.get(identifier, label).map_or(0, |e| e.frame_count)
    }

    pub fn get(&self, identifier: &str, label: &str) -> Option<&FrameCountEntry> {
        // HashMap lookups need an owned key; the strings are short.
        self.entries.get(&FrameKey {
            identifier: identifier.to_string(),
            label: label.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const NONE: &[&str] = &[];

    /// Tracked labels for `identifier` with their counts, sorted by label.
    fn labels_for<'a>(fc: &'a FrameCounter, identifier: &str) -> Vec<(&'a str, u32)> {
        let mut out: Vec<(&str, u32)> = fc
            .entries
            .iter()
            .filter(|(k, _)| k.identifier == identifier)
            .map(|(k, e)| (k.label.as_str(), e.frame_count))
            .collect();
        out.sort_unstable_by(|a, b| a.0.cmp(b.0));
        out
    }

    #[test]
    fn counts_up_per_tick() {
        let mut fc = FrameCounter::new();
        for _ in 0..3 {
            fc.tick("camA", &["person"]);
        }
        assert_eq!(fc.frame_count("camA", "person"), 3);
    }

    #[test]
    fn caps_at_ten_then_decays() {
        let mut fc = FrameCounter::new();
        for _ in 0..15 {
            fc.tick("camA", &["person"]);
        }
        assert_eq!(fc.frame_count("camA", "person"), MAX_FRAME_COUNT);

        fc.tick("camA", NONE);
        assert_eq!(fc.frame_count("camA", "person"), 9);

        for _ in 0..8 {
            fc.tick("camA", NONE);
        }
        assert_eq!(fc.frame_count("camA", "person"), 1);
        assert_eq!(fc.len(), 1);

        fc.tick("camA", NONE);
        assert_eq!(fc.frame_count("camA", "person"), 0);
        assert!(fc.is_empty());
    }

    #[test]
    fn unknown_pair_is_zero() {
        let fc = FrameCounter::new();
        assert_eq!(fc.frame_count("camA", "person"), 0);
        assert!(fc.get("camA", "person").is_none());
    }

    #[test]
    fn decay_only_touches_same_identifier() {
        let mut fc = FrameCounter::new();
        fc.tick("camA", &["person"]);
        fc.tick("camB", &["person"]);
        fc.tick("camB", &["person"]);

        fc.tick("camA", NONE);
        assert_eq!(fc.frame_count("camA", "person"), 0);
        assert_eq!(fc.frame_count("camB", "person"), 2);
    }

    #[test]
    fn absent_labels_decay_while_present_grow() {
        let mut fc = FrameCounter::new();
        fc.tick("camA", &["person", "dog"]);
        fc.tick("camA", &["person", "dog"]);
        fc.tick("camA", &["person"]);

        assert_eq!(fc.frame_count("camA", "person"), 3);
        assert_eq!(fc.frame_count("camA", "dog"), 1);
        assert_eq!(labels_for(&fc, "camA"), vec![("dog", 1), ("person", 3)]);

        fc.tick("camA", &["car"]);
        assert_eq!(labels_for(&fc, "camA"), vec![("car", 1), ("person", 2)]);
    }

    #[test]
    fn last_seen_only_moves_on_observation() {
        let t1 = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 5).unwrap();
        let t3 = Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 9).unwrap();

        let mut fc = FrameCounter::new();
        fc.tick_at("camA", &["person"], t1);
        fc.tick_at("camA", &["person"], t2);
        fc.tick_at("camA", NONE, t3);

        let entry = fc.get("camA", "person").unwrap();
        assert_eq!(entry.frame_count, 1);
        assert_eq!(entry.last_seen, t2);
    }

    #[test]
    fn accepts_owned_labels() {
        let mut fc = FrameCounter::new();
        let labels = vec!["person".to_string()];
        fc.tick("camA", &labels);
        assert_eq!(fc.frame_count("camA", "person"), 1);
    }
}
