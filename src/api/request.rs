//! Request types for the payroll engine API.
//!
//! Bodies that map one-to-one onto a service input (settings, deduction
//! application) deserialize straight into the domain type; the structures
//! here cover the rest.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::models::DateRange;

/// Body of `POST /attendance/punch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PunchRequest {
    /// The user punching in or out.
    pub user_id: String,
}

/// Query string of `GET /attendance/{user_id}/history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryQuery {
    /// First date, inclusive.
    pub start: NaiveDate,
    /// Last date, inclusive.
    pub end: NaiveDate,
}

impl HistoryQuery {
    /// The requested range.
    pub fn range(&self) -> EngineResult<DateRange> {
        DateRange::new(self.start, self.end)
    }
}

/// Body of `POST /attendance/bulk-delete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkDeleteRequest {
    /// Restrict deletion to one user; all users when absent.
    #[serde(default)]
    pub user_id: Option<String>,
    /// First date, inclusive.
    pub start: NaiveDate,
    /// Last date, inclusive.
    pub end: NaiveDate,
}

impl BulkDeleteRequest {
    /// The range to delete.
    pub fn range(&self) -> EngineResult<DateRange> {
        DateRange::new(self.start, self.end)
    }
}

/// Body of `POST /payroll/release`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseRequest {
    /// First date of the period that becomes active after release.
    pub next_period_start: NaiveDate,
    /// Last date of the next period.
    pub next_period_end: NaiveDate,
}

impl ReleaseRequest {
    /// The next payroll period.
    pub fn next_period(&self) -> EngineResult<DateRange> {
        DateRange::new(self.next_period_start, self.next_period_end)
    }
}

/// Result of a bulk delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkDeleteResponse {
    /// Number of records removed.
    pub deleted: usize,
}
