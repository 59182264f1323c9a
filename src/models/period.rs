//! Inclusive civil date ranges.
//!
//! A [`DateRange`] is used both for payroll periods and for attendance
//! queries. Both ends are inclusive civil dates in the engine's timezone.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// An inclusive range of civil dates.
///
/// # Example
///
/// ```
/// use payroll_engine::models::DateRange;
/// use chrono::NaiveDate;
///
/// let period = DateRange::new(
///     NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
/// )
/// .unwrap();
///
/// assert!(period.contains(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()));
/// assert!(period.contains(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()));
/// assert!(!period.contains(NaiveDate::from_ymd_opt(2026, 1, 16).unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First date of the range (inclusive).
    pub start: NaiveDate,
    /// Last date of the range (inclusive).
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range, rejecting an end that precedes the start.
    pub fn new(start: NaiveDate, end: NaiveDate) -> EngineResult<Self> {
        if end < start {
            return Err(EngineError::InvalidSettings {
                field: "period_end".to_string(),
                message: format!("{} is before period start {}", end, start),
            });
        }
        Ok(Self { start, end })
    }

    /// A range covering a single date.
    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Checks if a date falls within the range, inclusive of both ends.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Returns the range truncated so it ends no later than `limit`.
    ///
    /// Returns `None` when `limit` is before the start of the range.
    pub fn clamp_end(&self, limit: NaiveDate) -> Option<Self> {
        if limit < self.start {
            return None;
        }
        Some(Self {
            start: self.start,
            end: self.end.min(limit),
        })
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}
