//! Working-day calendars.
//!
//! A working day is any civil date that is not the configured rest day. The
//! same rule sizes a payroll period and drives per-day iteration over it.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::models::DateRange;

/// Checks if a date is a working day.
pub fn is_working_day(date: NaiveDate, rest_day: Weekday) -> bool {
    date.weekday() != rest_day
}

/// Returns the working days from `start` to `end` inclusive, in order.
///
/// An empty vector is returned when `end` precedes `start`.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::working_days;
/// use chrono::{NaiveDate, Weekday};
///
/// // 2026-01-01 is a Thursday; the 4th and 11th are Sundays.
/// let days = working_days(
///     NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
///     Weekday::Sun,
/// );
/// assert_eq!(days.len(), 13);
/// ```
pub fn working_days(start: NaiveDate, end: NaiveDate, rest_day: Weekday) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|date| *date <= end)
        .filter(|date| is_working_day(*date, rest_day))
        .collect()
}

/// Number of working days in a range.
pub fn count_working_days(range: DateRange, rest_day: Weekday) -> u32 {
    working_days(range.start, range.end, rest_day).len() as u32
}

/// Inclusive number of calendar days from `start` to `end`.
///
/// Zero when `end` precedes `start`.
pub fn period_duration_days(start: NaiveDate, end: NaiveDate) -> i64 {
    ((end - start).num_days() + 1).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_working_days_skip_rest_day() {
        let days = working_days(make_date("2026-01-03"), make_date("2026-01-06"), Weekday::Sun);
        assert_eq!(
            days,
            vec![
                make_date("2026-01-03"),
                make_date("2026-01-05"),
                make_date("2026-01-06"),
            ]
        );
    }

    #[test]
    fn test_saturday_is_a_working_day() {
        assert!(is_working_day(make_date("2026-01-03"), Weekday::Sun));
        assert!(!is_working_day(make_date("2026-01-04"), Weekday::Sun));
    }

    #[test]
    fn test_configurable_rest_day() {
        let days = working_days(make_date("2026-01-01"), make_date("2026-01-07"), Weekday::Sat);
        assert_eq!(days.len(), 6);
        assert!(!days.contains(&make_date("2026-01-03")));
        assert!(days.contains(&make_date("2026-01-04")));
    }

    #[test]
    fn test_inverted_range_is_empty() {
        assert!(working_days(make_date("2026-01-10"), make_date("2026-01-01"), Weekday::Sun).is_empty());
        assert_eq!(period_duration_days(make_date("2026-01-10"), make_date("2026-01-01")), 0);
    }

    #[test]
    fn test_single_rest_day_range_has_no_working_days() {
        let range = DateRange::single(make_date("2026-01-04"));
        assert_eq!(count_working_days(range, Weekday::Sun), 0);
    }

    #[test]
    fn test_period_duration_is_inclusive() {
        assert_eq!(period_duration_days(make_date("2026-01-01"), make_date("2026-01-15")), 15);
        assert_eq!(period_duration_days(make_date("2026-01-16"), make_date("2026-01-31")), 16);
        assert_eq!(period_duration_days(make_date("2026-01-05"), make_date("2026-01-05")), 1);
    }

    #[test]
    fn test_working_days_are_reproducible() {
        let first = working_days(make_date("2026-02-01"), make_date("2026-02-28"), Weekday::Sun);
        let second = working_days(make_date("2026-02-01"), make_date("2026-02-28"), Weekday::Sun);
        assert_eq!(first, second);
        assert_eq!(first.len(), 24);
    }
}
