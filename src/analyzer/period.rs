use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;

use super::filter::DateRange;

/// Half-open `[start, end)` window, used for the derived comparison period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HalfOpenRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl HalfOpenRange {
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        ts >= self.start && ts < self.end
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}

/// The window of identical length that ends where `current` starts.
/// Not calendar-aligned: `[2024-03-01, 2024-03-10]` yields `[2024-02-21, 2024-03-01)`.
/// An inverted input gives `start > end`, which contains nothing.
pub fn previous_period(current: &DateRange) -> HalfOpenRange {
    let span = current.end - current.start;
    HalfOpenRange {
        start: current.start - span,
        end: current.start,
    }
}

/// First day of the month containing `now` at midnight, up to `now`.
pub fn default_period(now: NaiveDateTime) -> DateRange {
    let first = NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(now);
    DateRange::new(first, now)
}

/// Calendar-day bucket key, "2024-03-01".
pub fn day_key(ts: NaiveDateTime) -> NaiveDate {
    ts.date()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_previous_period_nine_day_span() {
        let current = DateRange::new(dt("2024-03-01 00:00:00"), dt("2024-03-10 00:00:00"));
        let prev = previous_period(&current);
        assert_eq!(prev.start, dt("2024-02-21 00:00:00"));
        assert_eq!(prev.end, dt("2024-03-01 00:00:00"));
    }

    #[test]
    fn test_previous_period_same_duration_and_adjacent() {
        let current = DateRange::new(dt("2024-01-15 08:30:00"), dt("2024-04-02 17:45:10"));
        let prev = previous_period(&current);
        assert_eq!(prev.duration(), current.end - current.start);
        assert_eq!(prev.end, current.start);
    }

    #[test]
    fn test_previous_period_half_open() {
        let current = DateRange::new(dt("2024-03-01 00:00:00"), dt("2024-03-10 00:00:00"));
        let prev = previous_period(&current);
        assert!(prev.contains(dt("2024-02-21 00:00:00")));
        assert!(prev.contains(dt("2024-02-29 23:59:59")));
        assert!(!prev.contains(dt("2024-03-01 00:00:00")));
    }

    #[test]
    fn test_previous_period_inverted_is_empty() {
        let current = DateRange::new(dt("2024-03-10 00:00:00"), dt("2024-03-01 00:00:00"));
        let prev = previous_period(&current);
        assert!(prev.start > prev.end);
        assert!(!prev.contains(dt("2024-03-05 00:00:00")));
        assert!(!prev.contains(dt("2024-03-10 00:00:00")));
    }

    #[test]
    fn test_default_period_starts_on_first_of_month() {
        let now = dt("2024-03-17 14:05:00");
        let period = default_period(now);
        assert_eq!(period.start, dt("2024-03-01 00:00:00"));
        assert_eq!(period.end, now);
    }

    #[test]
    fn test_day_key_drops_time() {
        assert_eq!(
            day_key(dt("2024-03-01 23:59:59")).format("%Y-%m-%d").to_string(),
            "2024-03-01"
        );
    }
}
