//! Attendance records and the statuses derived from them.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The classification of one user's civil day.
///
/// Statuses are always derived from punches, settings and the clock. The
/// value stored on an [`AttendanceRecord`] is only a hint for indexing.
///
/// # Example
///
/// ```
/// use payroll_engine::models::AttendanceStatus;
///
/// let json = serde_json::to_string(&AttendanceStatus::NonWorking).unwrap();
/// assert_eq!(json, "\"NON_WORKING\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    /// The day has not resolved yet.
    Pending,
    /// Timed in on time.
    Present,
    /// Timed in after the cutoff plus grace.
    Late,
    /// Timed in but never timed out before the time-out window closed.
    Partial,
    /// No time-in once the time-in window closed.
    Absent,
    /// The configured rest day.
    NonWorking,
}

impl AttendanceStatus {
    /// Whether the user actually attended (present, late or partial).
    pub fn attended(self) -> bool {
        matches!(self, Self::Present | Self::Late | Self::Partial)
    }
}

impl std::fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Pending => "PENDING",
            Self::Present => "PRESENT",
            Self::Late => "LATE",
            Self::Partial => "PARTIAL",
            Self::Absent => "ABSENT",
            Self::NonWorking => "NON_WORKING",
        };
        f.write_str(label)
    }
}

/// The raw punches of one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Punches {
    /// Civil time of the first punch.
    pub time_in: Option<NaiveDateTime>,
    /// Civil time of the second punch.
    pub time_out: Option<NaiveDateTime>,
}

/// One user's attendance for one civil date.
///
/// At most one record exists per `(user_id, date)`; the store enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Record identifier.
    pub id: Uuid,
    /// The user the record belongs to.
    pub user_id: String,
    /// The civil date of the record.
    pub date: NaiveDate,
    /// Time-in punch.
    pub time_in: Option<NaiveDateTime>,
    /// Time-out punch.
    pub time_out: Option<NaiveDateTime>,
    /// Last derived status.
    pub status: AttendanceStatus,
}

impl AttendanceRecord {
    /// Creates a record without punches.
    pub fn new(user_id: impl Into<String>, date: NaiveDate, status: AttendanceStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            date,
            time_in: None,
            time_out: None,
            status,
        }
    }

    /// Creates a record from a first punch.
    pub fn timed_in(user_id: impl Into<String>, time_in: NaiveDateTime) -> Self {
        Self {
            time_in: Some(time_in),
            ..Self::new(user_id, time_in.date(), AttendanceStatus::Pending)
        }
    }

    /// The punches held by this record.
    pub fn punches(&self) -> Punches {
        Punches {
            time_in: self.time_in,
            time_out: self.time_out,
        }
    }
}
