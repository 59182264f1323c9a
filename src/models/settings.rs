//! Attendance settings and the time-of-day type they are built from.
//!
//! Settings are a single admin-editable record in the store. They are read
//! fresh for every computation and passed in explicitly.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::DateRange;
use crate::error::{EngineError, EngineResult};

/// Error returned when a string is not a well-formed `HH:mm` time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a valid HH:mm time of day")]
pub struct TimeOfDayParseError {
    /// The rejected input.
    pub value: String,
}

/// A civil time of day with minute precision.
///
/// Serialized as a zero-padded `HH:mm` string. Comparisons are plain
/// minute-of-day comparisons, independent of any date or offset.
///
/// # Example
///
/// ```
/// use payroll_engine::models::TimeOfDay;
///
/// let cutoff: TimeOfDay = "09:30".parse().unwrap();
/// assert_eq!(cutoff.minute_of_day(), 570);
/// assert_eq!(cutoff.to_string(), "09:30");
/// assert!("9:5".parse::<TimeOfDay>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    minutes: u16,
}

impl TimeOfDay {
    /// Builds a time of day from an hour and minute, if both are in range.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self {
            minutes: (hour * 60 + minute) as u16,
        })
    }

    /// Truncates a clock time to its minute.
    pub fn from_time(time: NaiveTime) -> Self {
        Self {
            minutes: (time.hour() * 60 + time.minute()) as u16,
        }
    }

    /// Minutes since midnight.
    pub fn minute_of_day(self) -> u32 {
        u32::from(self.minutes)
    }

    /// The time of day as a `NaiveTime` with zero seconds.
    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::MIN + Duration::minutes(i64::from(self.minutes))
    }

    /// The instant this time of day falls on for a given civil date.
    pub fn on(self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.to_naive_time())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes / 60, self.minutes % 60)
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeOfDayParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TimeOfDayParseError {
            value: s.to_string(),
        };

        let (hour, minute) = s.split_once(':').ok_or_else(invalid)?;
        let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
        if !two_digits(hour) || !two_digits(minute) {
            return Err(invalid());
        }
        let hour: u32 = hour.parse().map_err(|_| invalid())?;
        let minute: u32 = minute.parse().map_err(|_| invalid())?;
        Self::from_hm(hour, minute).ok_or_else(invalid)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = TimeOfDayParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(value: TimeOfDay) -> Self {
        value.to_string()
    }
}

fn default_true() -> bool {
    true
}

/// The attendance settings record.
///
/// Time windows are optional; an absent bound leaves that side of the window
/// unconstrained. The payroll period is optional too, but payroll generation
/// and release refuse to run without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSettings {
    /// Earliest accepted time-in.
    #[serde(default)]
    pub time_in_start: Option<TimeOfDay>,
    /// Time-in cutoff; later punches are late.
    #[serde(default)]
    pub time_in_end: Option<TimeOfDay>,
    /// Earliest time-out that is not an early departure.
    #[serde(default)]
    pub time_out_start: Option<TimeOfDay>,
    /// Time-out cutoff; a day still open after it is partial.
    #[serde(default)]
    pub time_out_end: Option<TimeOfDay>,
    /// First date of the active payroll period.
    #[serde(default)]
    pub period_start: Option<NaiveDate>,
    /// Last date of the active payroll period.
    #[serde(default)]
    pub period_end: Option<NaiveDate>,
    /// Whether the reconciliation sweep materializes absences.
    #[serde(default = "default_true")]
    pub auto_mark_absent: bool,
    /// Whether punches after the time-in cutoff are classified late.
    #[serde(default = "default_true")]
    pub auto_mark_late: bool,
}

impl Default for AttendanceSettings {
    fn default() -> Self {
        Self {
            time_in_start: None,
            time_in_end: None,
            time_out_start: None,
            time_out_end: None,
            period_start: None,
            period_end: None,
            auto_mark_absent: true,
            auto_mark_late: true,
        }
    }
}

impl AttendanceSettings {
    /// Checks window ordering and period consistency.
    ///
    /// # Example
    ///
    /// ```
    /// use payroll_engine::models::AttendanceSettings;
    ///
    /// let settings = AttendanceSettings {
    ///     time_in_start: Some("09:00".parse().unwrap()),
    ///     time_in_end: Some("08:00".parse().unwrap()),
    ///     ..AttendanceSettings::default()
    /// };
    /// assert!(settings.validate().is_err());
    /// ```
    pub fn validate(&self) -> EngineResult<()> {
        check_window(
            "time_in_start",
            self.time_in_start,
            "time_in_end",
            self.time_in_end,
        )?;
        check_window(
            "time_out_start",
            self.time_out_start,
            "time_out_end",
            self.time_out_end,
        )?;

        match (self.period_start, self.period_end) {
            (Some(start), Some(end)) => {
                DateRange::new(start, end)?;
            }
            (None, None) => {}
            (Some(_), None) => {
                return Err(EngineError::InvalidSettings {
                    field: "period_end".to_string(),
                    message: "must be set together with period_start".to_string(),
                });
            }
            (None, Some(_)) => {
                return Err(EngineError::InvalidSettings {
                    field: "period_start".to_string(),
                    message: "must be set together with period_end".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Returns the active payroll period or a configuration error.
    pub fn active_period(&self) -> EngineResult<DateRange> {
        match (self.period_start, self.period_end) {
            (Some(start), Some(end)) => DateRange::new(start, end),
            _ => Err(EngineError::configuration(
                "no active payroll period: set period start and end dates in attendance settings",
            )),
        }
    }

    /// Moves the active payroll period to `next`.
    pub fn advance_to(&mut self, next: DateRange) {
        self.period_start = Some(next.start);
        self.period_end = Some(next.end);
    }
}

fn check_window(
    start_field: &str,
    start: Option<TimeOfDay>,
    end_field: &str,
    end: Option<TimeOfDay>,
) -> EngineResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(EngineError::InvalidSettings {
                field: end_field.to_string(),
                message: format!("{} is before {} {}", end, start_field, start),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tod(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_valid_times() {
        assert_eq!(tod("00:00").minute_of_day(), 0);
        assert_eq!(tod("09:30").minute_of_day(), 570);
        assert_eq!(tod("23:59").minute_of_day(), 1439);
    }

    #[test]
    fn test_parse_rejects_malformed_times() {
        for bad in ["9:30", "09:3", "24:00", "12:60", "0930", "ab:cd", "", "09:30:00"] {
            assert!(bad.parse::<TimeOfDay>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_parse_rejects_signed_parts() {
        for bad in ["+9:30", "09:+5", "-1:30", " 9:30", "09: 5"] {
            assert!(bad.parse::<TimeOfDay>().is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_from_time_truncates_seconds() {
        let time = NaiveTime::from_hms_opt(9, 30, 59).unwrap();
        assert_eq!(TimeOfDay::from_time(time), tod("09:30"));
    }

    #[test]
    fn test_on_date_builds_instant() {
        let instant = tod("17:00").on(make_date("2026-01-05"));
        assert_eq!(instant.to_string(), "2026-01-05 17:00:00");
    }

    #[test]
    fn test_time_of_day_serializes_as_padded_string() {
        let json = serde_json::to_string(&tod("07:05")).unwrap();
        assert_eq!(json, "\"07:05\"");
        let back: TimeOfDay = serde_json::from_str("\"17:45\"").unwrap();
        assert_eq!(back, tod("17:45"));
        assert!(serde_json::from_str::<TimeOfDay>("\"7:45\"").is_err());
    }

    #[test]
    fn test_default_settings_enable_auto_marking() {
        let settings = AttendanceSettings::default();
        assert!(settings.auto_mark_absent);
        assert!(settings.auto_mark_late);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_inverted_time_out_window() {
        let settings = AttendanceSettings {
            time_out_start: Some(tod("18:00")),
            time_out_end: Some(tod("17:00")),
            ..AttendanceSettings::default()
        };
        match settings.validate() {
            Err(EngineError::InvalidSettings { field, .. }) => assert_eq!(field, "time_out_end"),
            other => panic!("Expected InvalidSettings, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_accepts_equal_bounds() {
        let settings = AttendanceSettings {
            time_in_start: Some(tod("08:00")),
            time_in_end: Some(tod("08:00")),
            ..AttendanceSettings::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_half_set_period() {
        let settings = AttendanceSettings {
            period_start: Some(make_date("2026-01-01")),
            ..AttendanceSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_active_period_missing_is_configuration_error() {
        let settings = AttendanceSettings::default();
        match settings.active_period() {
            Err(EngineError::Configuration { message }) => {
                assert!(message.contains("no active payroll period"));
            }
            other => panic!("Expected Configuration, got {:?}", other),
        }
    }

    #[test]
    fn test_advance_to_replaces_period() {
        let mut settings = AttendanceSettings {
            period_start: Some(make_date("2026-01-01")),
            period_end: Some(make_date("2026-01-15")),
            ..AttendanceSettings::default()
        };
        let next = DateRange::new(make_date("2026-01-16"), make_date("2026-01-31")).unwrap();
        settings.advance_to(next);
        assert_eq!(settings.active_period().unwrap(), next);
    }

    #[test]
    fn test_deserialize_settings_with_defaults() {
        let json = r#"{
            "time_in_start": "07:00",
            "time_in_end": "09:30",
            "time_out_start": "16:00",
            "time_out_end": "17:00"
        }"#;
        let settings: AttendanceSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.time_in_end, Some(tod("09:30")));
        assert!(settings.period_start.is_none());
        assert!(settings.auto_mark_late);
    }
}
