//! Operations that load inputs from the store, run the pure calculations
//! and write the results back.
//!
//! Services hold no state of their own beyond their collaborators. Settings
//! are re-read on every call.

mod attendance;
mod payroll;

pub use attendance::{AttendanceService, DayStatus, PunchKind, PunchOutcome, SweepReport};
pub use payroll::{
    ApplyDeduction, GenerationReport, PayrollEntryView, PayrollService, ReleaseReport,
};

use crate::error::EngineError;
use crate::store::StoreError;

/// Turns a store conflict into an actionable engine conflict.
///
/// Other store errors pass through unchanged.
fn conflict_as(error: StoreError, message: impl FnOnce() -> String) -> EngineError {
    match error {
        StoreError::Conflict { .. } => EngineError::conflict(message()),
        other => EngineError::Store(other),
    }
}
