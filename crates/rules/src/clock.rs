//! Time-of-week snapshot used by timeframe predicates.

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

/// Day, hour and minute at the instant a rule set is evaluated.
///
/// The evaluator never reads the clock itself; callers take one snapshot
/// per event so every window in that evaluation sees the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekTime {
    /// 0 = Sunday … 6 = Saturday.
    pub day_of_week: u32,
    pub hour: u32,
    pub minute: u32,
}

impl WeekTime {
    pub fn new(day_of_week: u32, hour: u32, minute: u32) -> Self {
        Self {
            day_of_week,
            hour,
            minute,
        }
    }

    pub fn from_datetime<Tz: TimeZone>(at: &DateTime<Tz>) -> Self {
        Self {
            day_of_week: at.weekday().num_days_from_sunday(),
            hour: at.hour(),
            minute: at.minute(),
        }
    }

    /// Current wall-clock time in the host's local zone.
    pub fn now() -> Self {
        Self::from_datetime(&Local::now())
    }
}
