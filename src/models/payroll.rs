//! Payroll entries, computed breakdowns and the frozen snapshot.
//!
//! A [`PayrollBreakdown`] is the full output of period aggregation for one
//! user. A released entry carries it as a [`BreakdownSnapshot`], a versioned
//! value that reads of the entry return verbatim.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AdditionKind, AttendanceStatus, AuditStep, CalculationType, DateRange};

/// Lifecycle of a payroll entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayrollStatus {
    /// Generated, figures still live.
    Pending,
    /// Released, figures frozen.
    Released,
    /// Superseded history.
    Archived,
}

/// One attendance day as it contributed to a breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayLine {
    /// The working day.
    pub date: NaiveDate,
    /// Resolved status for the day.
    pub status: AttendanceStatus,
    /// Time-in punch, if any.
    pub time_in: Option<NaiveDateTime>,
    /// Time-out punch, if any.
    pub time_out: Option<NaiveDateTime>,
    /// Seconds past the time-in cutoff.
    pub seconds_late: i64,
    /// Seconds before the time-out window opened.
    pub seconds_early: i64,
    /// Hours worked, live-accrued for an open day.
    pub hours_worked: Decimal,
    /// Earnings for the hours worked.
    pub earnings: Decimal,
    /// Lateness deduction.
    pub late_deduction: Decimal,
    /// Early time-out deduction.
    pub early_timeout_deduction: Decimal,
    /// Full-day absence deduction.
    pub absence_deduction: Decimal,
    /// Hours-short deduction for a partial day.
    pub partial_deduction: Decimal,
    /// Sum of the deductions above.
    pub total_deduction: Decimal,
}

/// A standing deduction as it contributed to a breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingLine {
    /// The deduction instance.
    pub deduction_id: Uuid,
    /// Its type.
    pub deduction_type_id: Uuid,
    /// Type name.
    pub name: String,
    /// Fixed or percentage.
    pub calculation_type: CalculationType,
    /// Whether the type is mandatory.
    pub is_mandatory: bool,
    /// Amount deducted this period.
    pub amount: Decimal,
    /// True when the instance did not exist yet and was materialized.
    pub materialized: bool,
}

/// A loan installment as it contributed to a breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanLine {
    /// The loan.
    pub loan_id: Uuid,
    /// Principal.
    pub principal: Decimal,
    /// Balance before this period's installment.
    pub balance_before: Decimal,
    /// Installment deducted this period, capped at the balance.
    pub installment: Decimal,
}

/// An addition as it contributed to a breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionLine {
    /// The addition.
    pub addition_id: Uuid,
    /// Its category.
    pub kind: AdditionKind,
    /// Its description.
    pub description: String,
    /// Amount added.
    pub amount: Decimal,
}

/// Period totals, rounded to cents.
///
/// # Example
///
/// ```
/// use payroll_engine::models::PayrollTotals;
/// use rust_decimal::Decimal;
///
/// let totals = PayrollTotals::default();
/// assert_eq!(totals.net_salary, Decimal::ZERO);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollTotals {
    /// Basis salary plus additions.
    pub gross_salary: Decimal,
    /// Lateness, early time-out, absence and partial-day deductions.
    pub attendance_deductions: Decimal,
    /// Mandatory and one-off deductions.
    pub standing_deductions: Decimal,
    /// Loan installments.
    pub loan_deductions: Decimal,
    /// All deductions.
    pub total_deductions: Decimal,
    /// All additions.
    pub total_additions: Decimal,
    /// Gross minus deductions, never negative.
    pub net_salary: Decimal,
    /// Hours worked across the period.
    pub total_work_hours: Decimal,
    /// Earnings for the hours worked.
    pub total_earnings: Decimal,
}

/// The complete computation for one user and one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollBreakdown {
    /// The user.
    pub user_id: String,
    /// The payroll period.
    pub period: DateRange,
    /// Civil time of the computation.
    pub computed_at: NaiveDateTime,
    /// Monthly basic salary.
    pub monthly_basic: Decimal,
    /// Semi-monthly basis salary.
    pub basis_salary: Decimal,
    /// Working days in the whole period.
    pub working_days_in_period: u32,
    /// Per-day attendance detail up to the computation date.
    pub days: Vec<DayLine>,
    /// Standing deductions.
    pub standing_deductions: Vec<StandingLine>,
    /// Loan installments.
    pub loans: Vec<LoanLine>,
    /// Additions.
    pub additions: Vec<AdditionLine>,
    /// Totals.
    pub totals: PayrollTotals,
    /// Ordered record of every rule applied.
    pub audit_trace: Vec<AuditStep>,
}

/// A frozen breakdown with an explicit schema version.
///
/// Serialized with a `version` tag so later schema versions can be added
/// without losing the ability to read old snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "version")]
pub enum BreakdownSnapshot {
    /// First schema.
    #[serde(rename = "1")]
    V1(PayrollBreakdown),
}

impl BreakdownSnapshot {
    /// Freezes a breakdown under the current schema.
    pub fn freeze(breakdown: PayrollBreakdown) -> Self {
        Self::V1(breakdown)
    }

    /// The frozen breakdown.
    pub fn breakdown(&self) -> &PayrollBreakdown {
        match self {
            Self::V1(breakdown) => breakdown,
        }
    }

    /// The frozen totals.
    pub fn totals(&self) -> &PayrollTotals {
        &self.breakdown().totals
    }
}

/// A persisted payroll row for one user and period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollEntry {
    /// Entry identifier.
    pub id: Uuid,
    /// The user.
    pub user_id: String,
    /// The payroll period.
    pub period: DateRange,
    /// Gross for the period.
    pub basic_salary: Decimal,
    /// Total deductions.
    pub deductions: Decimal,
    /// Net pay.
    pub net_pay: Decimal,
    /// Lifecycle status.
    pub status: PayrollStatus,
    /// Civil time of generation.
    pub created_at: NaiveDateTime,
    /// Civil time of release.
    #[serde(default)]
    pub released_at: Option<NaiveDateTime>,
    /// Civil time the entry was superseded.
    #[serde(default)]
    pub archived_at: Option<NaiveDateTime>,
    /// Frozen computation.
    #[serde(default)]
    pub breakdown_snapshot: Option<BreakdownSnapshot>,
}

impl PayrollEntry {
    /// Creates a pending entry from a breakdown.
    ///
    /// The breakdown is kept as the generation-time snapshot. Reads of a
    /// pending entry recompute instead of using it.
    pub fn pending(breakdown: PayrollBreakdown, created_at: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: breakdown.user_id.clone(),
            period: breakdown.period,
            basic_salary: breakdown.totals.gross_salary,
            deductions: breakdown.totals.total_deductions,
            net_pay: breakdown.totals.net_salary,
            status: PayrollStatus::Pending,
            created_at,
            released_at: None,
            archived_at: None,
            breakdown_snapshot: Some(BreakdownSnapshot::freeze(breakdown)),
        }
    }

    /// Pending or released.
    pub fn is_live(&self) -> bool {
        matches!(self.status, PayrollStatus::Pending | PayrollStatus::Released)
    }
}
