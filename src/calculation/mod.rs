//! Calculation logic for the payroll engine.
//!
//! This module contains the pure functions behind every figure the engine
//! reports: working-day calendars, time window checks, attendance status
//! resolution, deduction and earnings rates, loan amortization and period
//! aggregation.

mod calendar;
mod deduction;
mod loan;
mod payroll;
mod rules;
mod status;
mod time_window;

pub use calendar::{count_working_days, is_working_day, period_duration_days, working_days};
pub use deduction::{
    SECONDS_PER_HOUR, STANDARD_DAILY_HOURS, absence_deduction, daily_rate, early_timeout_deduction,
    earnings, hourly_rate, hours_between, late_cap_ratio, late_deduction, partial_deduction,
    per_second_rate, standing_deduction_amount,
};
pub use loan::{LoanPayment, apply_payment, installment, record_payment, semi_monthly_factor};
pub use payroll::{PayrollInputs, aggregate, round_money};
pub use rules::{AttendanceRules, DEFAULT_LATE_GRACE_MINUTES};
pub use status::{day_closed, resolve_status, seconds_early, seconds_late, time_in_window_closed};
pub use time_window::{WindowPosition, is_late, window_position, within_window};
