//! Attendance deductions, earnings and standing deduction amounts.
//!
//! Rates derive from the full monthly basic salary spread over the working
//! days of a period: a daily rate, an hourly rate over an eight-hour day and
//! a per-second rate. The semi-monthly halving applies to the gross basis
//! only, never to these rates. No function here returns a negative amount. A period
//! with zero working days yields zero rates rather than an error.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::models::{CalculationType, DeductionType};

/// Hours in a standard working day.
pub const STANDARD_DAILY_HOURS: u32 = 8;

/// Seconds in an hour.
pub const SECONDS_PER_HOUR: u32 = 3600;

/// Returns the share of a daily rate that caps a single lateness or
/// early time-out deduction.
///
/// The cap is 0.5 (half a day's pay).
pub fn late_cap_ratio() -> Decimal {
    Decimal::new(5, 1)
}

/// Monthly basic divided by working days.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::daily_rate;
/// use rust_decimal::Decimal;
///
/// assert_eq!(daily_rate(Decimal::new(26000, 0), 13), Decimal::new(2000, 0));
/// assert_eq!(daily_rate(Decimal::new(26000, 0), 0), Decimal::ZERO);
/// ```
pub fn daily_rate(monthly_basic: Decimal, working_days: u32) -> Decimal {
    if working_days == 0 {
        tracing::warn!(
            monthly_basic = %monthly_basic,
            "No working days in period; deduction rates default to zero"
        );
        return Decimal::ZERO;
    }
    monthly_basic / Decimal::from(working_days)
}

/// Daily rate divided by the standard day length.
pub fn hourly_rate(monthly_basic: Decimal, working_days: u32) -> Decimal {
    daily_rate(monthly_basic, working_days) / Decimal::from(STANDARD_DAILY_HOURS)
}

/// Hourly rate divided by the seconds in an hour.
pub fn per_second_rate(monthly_basic: Decimal, working_days: u32) -> Decimal {
    hourly_rate(monthly_basic, working_days) / Decimal::from(SECONDS_PER_HOUR)
}

fn capped_by_seconds(seconds: i64, monthly_basic: Decimal, working_days: u32) -> Decimal {
    if seconds <= 0 {
        return Decimal::ZERO;
    }
    let raw = Decimal::from(seconds) * per_second_rate(monthly_basic, working_days);
    let cap = daily_rate(monthly_basic, working_days) * late_cap_ratio();
    raw.min(cap)
}

/// Deduction for arriving after the expected time-in.
///
/// `seconds_late × per_second_rate`, capped at half the daily rate.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::{late_deduction, per_second_rate};
/// use chrono::NaiveDateTime;
/// use rust_decimal::Decimal;
///
/// let expected = NaiveDateTime::parse_from_str("2026-01-05 09:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let actual = NaiveDateTime::parse_from_str("2026-01-05 09:31:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let monthly_basic = Decimal::new(26000, 0);
///
/// let deduction = late_deduction(actual, expected, monthly_basic, 13);
/// assert_eq!(deduction, Decimal::from(60) * per_second_rate(monthly_basic, 13));
/// ```
pub fn late_deduction(
    time_in: NaiveDateTime,
    expected_time_in: NaiveDateTime,
    monthly_basic: Decimal,
    working_days: u32,
) -> Decimal {
    capped_by_seconds(
        (time_in - expected_time_in).num_seconds(),
        monthly_basic,
        working_days,
    )
}

/// Deduction for timing out before the expected time-out.
///
/// Mirrors [`late_deduction`] with `expected − actual`, same cap.
pub fn early_timeout_deduction(
    time_out: NaiveDateTime,
    expected_time_out: NaiveDateTime,
    monthly_basic: Decimal,
    working_days: u32,
) -> Decimal {
    capped_by_seconds(
        (expected_time_out - time_out).num_seconds(),
        monthly_basic,
        working_days,
    )
}

/// A full day's pay.
pub fn absence_deduction(monthly_basic: Decimal, working_days: u32) -> Decimal {
    daily_rate(monthly_basic, working_days)
}

/// Hours short of `expected_hours` times the hourly rate.
///
/// Zero when `actual_hours` meets or exceeds the expectation.
pub fn partial_deduction(
    monthly_basic: Decimal,
    actual_hours: Decimal,
    expected_hours: Decimal,
    working_days: u32,
) -> Decimal {
    let short = (expected_hours - actual_hours).max(Decimal::ZERO);
    short * hourly_rate(monthly_basic, working_days)
}

/// Hours between two civil times, zero if `to` precedes `from`.
pub fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> Decimal {
    let seconds = (to - from).num_seconds().max(0);
    Decimal::from(seconds) / Decimal::from(SECONDS_PER_HOUR)
}

/// Pay earned for the hours worked.
///
/// Without a time-out the hours run to `now`, so the figure grows while the
/// day is open.
pub fn earnings(
    monthly_basic: Decimal,
    working_days: u32,
    time_in: NaiveDateTime,
    time_out: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> Decimal {
    let until = time_out.unwrap_or(now);
    hours_between(time_in, until) * hourly_rate(monthly_basic, working_days)
}

/// The period amount of a standing deduction type.
///
/// Fixed types use their configured amount. Percentage types take
/// `salary_basis × percentage_value / 100`. Missing values count as zero.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::standing_deduction_amount;
/// use payroll_engine::models::{CalculationType, DeductionType};
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
///
/// let philhealth = DeductionType {
///     id: Uuid::new_v4(),
///     name: "PhilHealth".to_string(),
///     calculation_type: CalculationType::Percentage,
///     amount: None,
///     percentage_value: Some(Decimal::new(25, 1)),
///     is_mandatory: true,
///     is_active: true,
/// };
/// assert_eq!(
///     standing_deduction_amount(&philhealth, Decimal::new(15000, 0)),
///     Decimal::new(375, 0)
/// );
/// ```
pub fn standing_deduction_amount(deduction_type: &DeductionType, salary_basis: Decimal) -> Decimal {
    let amount = match deduction_type.calculation_type {
        CalculationType::Fixed => deduction_type.amount.unwrap_or(Decimal::ZERO),
        CalculationType::Percentage => {
            salary_basis * deduction_type.percentage_value.unwrap_or(Decimal::ZERO)
                / Decimal::ONE_HUNDRED
        }
    };
    amount.max(Decimal::ZERO)
}
