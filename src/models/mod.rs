//! Core data models for the payroll engine.
//!
//! This module contains all the domain models used throughout the engine.

mod addition;
mod attendance;
mod audit;
mod deduction;
mod loan;
mod payroll;
mod period;
mod personnel;
mod settings;

pub use addition::{Addition, AdditionKind};
pub use attendance::{AttendanceRecord, AttendanceStatus, Punches};
pub use audit::AuditStep;
pub use deduction::{CalculationType, Deduction, DeductionType};
pub use loan::{Loan, LoanStatus};
pub use payroll::{
    AdditionLine, BreakdownSnapshot, DayLine, LoanLine, PayrollBreakdown, PayrollEntry,
    PayrollStatus, PayrollTotals, StandingLine,
};
pub use period::DateRange;
pub use personnel::{Personnel, PersonnelType};
pub use settings::{AttendanceSettings, TimeOfDay, TimeOfDayParseError};
