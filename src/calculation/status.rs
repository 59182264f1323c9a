//! Attendance status resolution.
//!
//! Status is a pure function of the day's punches, the settings, the rules
//! and the current civil time. It is re-evaluated on every read because
//! "now" can cross a cutoff between two reads of the same day.

use chrono::{NaiveDate, NaiveDateTime};

use super::calendar::is_working_day;
use super::rules::AttendanceRules;
use super::time_window::{WindowPosition, is_late, window_position};
use crate::models::{AttendanceSettings, AttendanceStatus, Punches, TimeOfDay};

/// Resolves the status of one user's civil day.
///
/// Rules, in precedence order:
///
/// 1. The rest day is `NonWorking`, whatever was punched.
/// 2. Without a time-in: a future day is `Pending`, a past day is `Absent`,
///    and today is `Absent` once the time-in window has closed, else
///    `Pending`.
/// 3. With a time-in: `Late` when late classification is enabled and the
///    punch is past the cutoff plus grace, else `Present`.
/// 4. A time-in day still open after the time-out window closed (or on an
///    earlier date) is downgraded to `Partial`. A day with both punches is
///    final.
///
/// # Arguments
///
/// * `date` - The civil date being resolved
/// * `punches` - The day's punches, empty when no record exists
/// * `now` - Current civil time
/// * `settings` - Attendance windows and flags
/// * `rules` - Rest day and grace minutes
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::{AttendanceRules, resolve_status};
/// use payroll_engine::models::{AttendanceSettings, AttendanceStatus, Punches};
/// use chrono::NaiveDateTime;
///
/// let settings = AttendanceSettings {
///     time_in_end: Some("09:30".parse().unwrap()),
///     ..AttendanceSettings::default()
/// };
/// let now = NaiveDateTime::parse_from_str("2026-01-05 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
///
/// let status = resolve_status(
///     now.date(),
///     Punches::default(),
///     now,
///     &settings,
///     &AttendanceRules::default(),
/// );
/// assert_eq!(status, AttendanceStatus::Absent);
/// ```
pub fn resolve_status(
    date: NaiveDate,
    punches: Punches,
    now: NaiveDateTime,
    settings: &AttendanceSettings,
    rules: &AttendanceRules,
) -> AttendanceStatus {
    if !is_working_day(date, rules.rest_day) {
        return AttendanceStatus::NonWorking;
    }

    let today = now.date();

    let Some(time_in) = punches.time_in else {
        return if date > today {
            AttendanceStatus::Pending
        } else if date < today || time_in_window_closed(now, settings) {
            AttendanceStatus::Absent
        } else {
            AttendanceStatus::Pending
        };
    };

    let arrived = if settings.auto_mark_late && punched_late(time_in, settings, rules) {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    };

    if punches.time_out.is_some() {
        return arrived;
    }

    if day_closed(date, now, settings) {
        AttendanceStatus::Partial
    } else {
        arrived
    }
}

/// True once the current time of day is past the time-in cutoff.
///
/// Without a cutoff the window never closes.
pub fn time_in_window_closed(now: NaiveDateTime, settings: &AttendanceSettings) -> bool {
    window_position(TimeOfDay::from_time(now.time()), None, settings.time_in_end)
        == WindowPosition::After
}

/// True when an open day can no longer be timed out.
///
/// Earlier dates are always closed. Today closes when the time-out window
/// ends; without a time-out cutoff, today stays open.
pub fn day_closed(date: NaiveDate, now: NaiveDateTime, settings: &AttendanceSettings) -> bool {
    let today = now.date();
    if date < today {
        return true;
    }
    if date > today {
        return false;
    }
    window_position(TimeOfDay::from_time(now.time()), None, settings.time_out_end)
        == WindowPosition::After
}

fn punched_late(
    time_in: NaiveDateTime,
    settings: &AttendanceSettings,
    rules: &AttendanceRules,
) -> bool {
    settings.time_in_end.is_some_and(|end| {
        is_late(
            TimeOfDay::from_time(time_in.time()),
            end,
            rules.late_grace_minutes,
        )
    })
}

/// Seconds between the time-in cutoff on `date` and the time-in punch.
///
/// Zero for punches at or before the cutoff, or when no cutoff is set.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::seconds_late;
/// use payroll_engine::models::AttendanceSettings;
/// use chrono::NaiveDateTime;
///
/// let settings = AttendanceSettings {
///     time_in_end: Some("09:30".parse().unwrap()),
///     ..AttendanceSettings::default()
/// };
/// let punch = NaiveDateTime::parse_from_str("2026-01-05 09:31:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// assert_eq!(seconds_late(punch, &settings), 60);
/// ```
pub fn seconds_late(time_in: NaiveDateTime, settings: &AttendanceSettings) -> i64 {
    settings
        .time_in_end
        .map(|end| (time_in - end.on(time_in.date())).num_seconds().max(0))
        .unwrap_or(0)
}

/// Seconds between a time-out punch and the opening of the time-out window.
///
/// Zero for punches at or after the window opens, or when no window is set.
pub fn seconds_early(time_out: NaiveDateTime, settings: &AttendanceSettings) -> i64 {
    settings
        .time_out_start
        .map(|start| (start.on(time_out.date()) - time_out).num_seconds().max(0))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn settings() -> AttendanceSettings {
        AttendanceSettings {
            time_in_start: Some("07:00".parse().unwrap()),
            time_in_end: Some("09:30".parse().unwrap()),
            time_out_start: Some("16:00".parse().unwrap()),
            time_out_end: Some("17:00".parse().unwrap()),
            ..AttendanceSettings::default()
        }
    }

    fn resolve(date: &str, time_in: Option<&str>, time_out: Option<&str>, now: &str) -> AttendanceStatus {
        let punches = Punches {
            time_in: time_in.map(make_datetime),
            time_out: time_out.map(make_datetime),
        };
        resolve_status(
            make_date(date),
            punches,
            make_datetime(now),
            &settings(),
            &AttendanceRules::default(),
        )
    }

    // 2026-01-05 is a Monday, 2026-01-04 a Sunday.

    #[test]
    fn test_no_punch_before_cutoff_is_pending() {
        assert_eq!(resolve("2026-01-05", None, None, "2026-01-05 08:00:00"), AttendanceStatus::Pending);
        assert_eq!(resolve("2026-01-05", None, None, "2026-01-05 06:00:00"), AttendanceStatus::Pending);
    }

    #[test]
    fn test_no_punch_during_cutoff_minute_is_pending() {
        assert_eq!(resolve("2026-01-05", None, None, "2026-01-05 09:30:59"), AttendanceStatus::Pending);
    }

    #[test]
    fn test_no_punch_after_cutoff_is_absent() {
        assert_eq!(resolve("2026-01-05", None, None, "2026-01-05 10:00:00"), AttendanceStatus::Absent);
    }

    #[test]
    fn test_no_punch_on_past_day_is_absent() {
        assert_eq!(resolve("2026-01-05", None, None, "2026-01-06 07:00:00"), AttendanceStatus::Absent);
    }

    #[test]
    fn test_no_punch_on_future_day_is_pending() {
        assert_eq!(resolve("2026-01-07", None, None, "2026-01-06 12:00:00"), AttendanceStatus::Pending);
    }

    #[test]
    fn test_rest_day_is_non_working_even_in_the_past() {
        assert_eq!(resolve("2026-01-04", None, None, "2026-01-06 12:00:00"), AttendanceStatus::NonWorking);
        assert_eq!(
            resolve("2026-01-04", Some("2026-01-04 08:00:00"), None, "2026-01-06 12:00:00"),
            AttendanceStatus::NonWorking
        );
    }

    #[test]
    fn test_punch_at_cutoff_is_present() {
        assert_eq!(
            resolve("2026-01-05", Some("2026-01-05 09:30:00"), None, "2026-01-05 10:00:00"),
            AttendanceStatus::Present
        );
    }

    #[test]
    fn test_punch_one_minute_after_cutoff_is_late() {
        assert_eq!(
            resolve("2026-01-05", Some("2026-01-05 09:31:00"), None, "2026-01-05 10:00:00"),
            AttendanceStatus::Late
        );
    }

    #[test]
    fn test_auto_mark_late_disabled_keeps_present() {
        let settings = AttendanceSettings {
            auto_mark_late: false,
            ..settings()
        };
        let punches = Punches {
            time_in: Some(make_datetime("2026-01-05 11:00:00")),
            time_out: None,
        };
        let status = resolve_status(
            make_date("2026-01-05"),
            punches,
            make_datetime("2026-01-05 12:00:00"),
            &settings,
            &AttendanceRules::default(),
        );
        assert_eq!(status, AttendanceStatus::Present);
    }

    #[test]
    fn test_open_day_after_time_out_window_is_partial() {
        assert_eq!(
            resolve("2026-01-05", Some("2026-01-05 08:00:00"), None, "2026-01-05 18:00:00"),
            AttendanceStatus::Partial
        );
    }

    #[test]
    fn test_open_day_within_time_out_window_stays_live() {
        assert_eq!(
            resolve("2026-01-05", Some("2026-01-05 09:45:00"), None, "2026-01-05 16:30:00"),
            AttendanceStatus::Late
        );
    }

    #[test]
    fn test_open_day_in_the_past_is_partial() {
        assert_eq!(
            resolve("2026-01-05", Some("2026-01-05 08:00:00"), None, "2026-01-06 08:00:00"),
            AttendanceStatus::Partial
        );
    }

    #[test]
    fn test_both_punches_are_final() {
        assert_eq!(
            resolve(
                "2026-01-05",
                Some("2026-01-05 09:45:00"),
                Some("2026-01-05 17:00:00"),
                "2026-01-09 12:00:00"
            ),
            AttendanceStatus::Late
        );
    }

    #[test]
    fn test_without_time_out_cutoff_today_never_goes_partial() {
        let settings = AttendanceSettings {
            time_out_end: None,
            ..settings()
        };
        let punches = Punches {
            time_in: Some(make_datetime("2026-01-05 08:00:00")),
            time_out: None,
        };
        let status = resolve_status(
            make_date("2026-01-05"),
            punches,
            make_datetime("2026-01-05 23:00:00"),
            &settings,
            &AttendanceRules::default(),
        );
        assert_eq!(status, AttendanceStatus::Present);
    }

    #[test]
    fn test_seconds_late_and_early() {
        assert_eq!(seconds_late(make_datetime("2026-01-05 09:31:00"), &settings()), 60);
        assert_eq!(seconds_late(make_datetime("2026-01-05 09:00:00"), &settings()), 0);
        assert_eq!(seconds_early(make_datetime("2026-01-05 15:30:00"), &settings()), 1800);
        assert_eq!(seconds_early(make_datetime("2026-01-05 16:10:00"), &settings()), 0);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let first = resolve("2026-01-05", Some("2026-01-05 09:40:00"), None, "2026-01-05 17:30:00");
        let second = resolve("2026-01-05", Some("2026-01-05 09:40:00"), None, "2026-01-05 17:30:00");
        assert_eq!(first, second);
    }
}
