pub mod config;
pub mod import;
pub mod prices;
pub mod report;
pub mod tickets;
pub mod warranty;

use chrono::{NaiveDateTime, NaiveTime, Utc};

use crate::analyzer::filter::DateRange;
use crate::analyzer::period::default_period;
use crate::error::AppError;
use crate::parser::deserializers::parse_timestamp;

/// Current instant on the same naive-UTC scale as stored timestamps.
pub fn utc_now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Parses a user-supplied range bound. A bare date as the upper bound means the end of that day.
pub fn parse_bound(value: &str, end_of_day: bool) -> Result<NaiveDateTime, AppError> {
    let ts = parse_timestamp(value).ok_or_else(|| AppError::InvalidDate(value.to_string()))?;
    let bare_date = !value.trim().contains(|c: char| c == ' ' || c == 'T' || c == ':');
    if end_of_day && bare_date {
        let last = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
        return Ok(ts.date().and_time(last));
    }
    Ok(ts)
}

/// Builds the report window from optional bounds; missing bounds come from the
/// current-month default ending at `now`.
pub fn parse_range(
    from: Option<&str>,
    to: Option<&str>,
    now: NaiveDateTime,
) -> Result<DateRange, AppError> {
    let default = default_period(now);
    let start = match from {
        Some(s) => parse_bound(s, false)?,
        None => default.start,
    };
    let end = match to {
        Some(s) => parse_bound(s, true)?,
        None => default.end,
    };
    Ok(DateRange::new(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_parse_range_bare_dates() {
        let range = parse_range(Some("2024-03-01"), Some("2024-03-10"), dt("2024-05-05 12:00:00"))
            .unwrap();
        assert_eq!(range.start, dt("2024-03-01 00:00:00"));
        assert_eq!(range.end, dt("2024-03-10 23:59:59"));
    }

    #[test]
    fn test_parse_range_explicit_time_kept() {
        let range = parse_range(None, Some("2024-03-10 08:00"), dt("2024-03-15 12:00:00")).unwrap();
        assert_eq!(range.start, dt("2024-03-01 00:00:00"));
        assert_eq!(range.end, dt("2024-03-10 08:00:00"));
    }

    #[test]
    fn test_parse_range_defaults_to_month() {
        let now = dt("2024-03-15 12:00:00");
        let range = parse_range(None, None, now).unwrap();
        assert_eq!(range, default_period(now));
    }

    #[test]
    fn test_default_range_uses_utc_clock() {
        let created = parse_timestamp(&Utc::now().to_rfc3339()).unwrap();
        let range = parse_range(None, None, utc_now()).unwrap();
        assert!(range.contains(created));
        assert!((range.end - created).num_seconds().abs() < 60);
    }

    #[test]
    fn test_offset_timestamp_inside_default_month() {
        // 01:00 on 1 March at UTC+5 is still 29 February in UTC
        let created = parse_timestamp("2024-03-01T01:00:00+05:00").unwrap();
        assert_eq!(created, dt("2024-02-29 20:00:00"));
        let february = parse_range(None, None, dt("2024-02-29 23:00:00")).unwrap();
        assert!(february.contains(created));
    }

    #[test]
    fn test_parse_range_invalid() {
        let err = parse_range(Some("yesterday"), None, dt("2024-03-15 12:00:00")).unwrap_err();
        assert!(matches!(err, AppError::InvalidDate(s) if s == "yesterday"));
    }
}
