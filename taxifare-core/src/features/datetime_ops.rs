use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

pub const PICKUP_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const ISO_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// parses a pickup timestamp such as `2009-06-15 17:26:21 UTC`. the zone
/// suffix, when present, must denote UTC. an ISO `T` separator and a bare
/// date (read as midnight) are accepted as well.
pub fn parse_pickup_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    let trimmed = trimmed
        .strip_suffix("UTC")
        .or_else(|| trimmed.strip_suffix('Z'))
        .or_else(|| trimmed.strip_suffix("+00:00"))
        .unwrap_or(trimmed)
        .trim_end();
    NaiveDateTime::parse_from_str(trimmed, PICKUP_DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, ISO_DATETIME_FORMAT))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// calendar fields extracted from a pickup timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFields {
    /// day of month, 1-31
    pub day: i32,
    pub hour: i32,
    /// ISO weekday shifted to start at zero: Monday = 0 .. Sunday = 6
    pub day_of_week: i32,
    /// ISO 8601 week number
    pub week_of_year: i32,
    pub month: i32,
    pub quarter: i32,
    pub year: i32,
}

impl From<&NaiveDateTime> for CalendarFields {
    fn from(value: &NaiveDateTime) -> Self {
        let month = value.month() as i32;
        CalendarFields {
            day: value.day() as i32,
            hour: value.hour() as i32,
            day_of_week: value.weekday().num_days_from_monday() as i32,
            week_of_year: value.iso_week().week() as i32,
            month,
            quarter: (month - 1) / 3 + 1,
            year: value.year(),
        }
    }
}

/// how the overnight indicator is derived from the hour of day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LateNightRule {
    /// `hour <= 6 AND hour >= 20`, which no hour satisfies. the flag is always 0.
    #[default]
    AsRecorded,
    /// `hour <= 6 OR hour >= 20`, the window wrapping around midnight.
    Wrapped,
}

impl LateNightRule {
    #[allow(clippy::impossible_comparisons)]
    pub fn flag(&self, hour: i32) -> i32 {
        let is_late = match self {
            LateNightRule::AsRecorded => hour <= 6 && hour >= 20,
            LateNightRule::Wrapped => hour <= 6 || hour >= 20,
        };
        i32::from(is_late)
    }
}

/// evening commute indicator: weekday pickups between 16:00 and 20:59.
pub fn night_flag(hour: i32, day_of_week: i32) -> i32 {
    i32::from((16..=20).contains(&hour) && day_of_week < 5)
}
