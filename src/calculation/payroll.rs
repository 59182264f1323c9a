//! Period aggregation for one user.
//!
//! [`aggregate`] is pure: every input, including the settings snapshot and
//! the current civil time, is passed in. The services layer loads the inputs
//! from the store and persists the results.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use super::calendar::{count_working_days, working_days};
use super::deduction::{
    STANDARD_DAILY_HOURS, absence_deduction, daily_rate, early_timeout_deduction, hours_between,
    hourly_rate, late_deduction, partial_deduction, standing_deduction_amount,
};
use super::loan::{apply_payment, installment, semi_monthly_factor};
use super::rules::AttendanceRules;
use super::status::{resolve_status, seconds_early, seconds_late};
use crate::models::{
    Addition, AdditionLine, AttendanceRecord, AttendanceSettings, AttendanceStatus, AuditStep,
    DateRange, DayLine, Deduction, DeductionType, Loan, LoanLine, PayrollBreakdown, PayrollTotals,
    Personnel, Punches, StandingLine,
};

/// Everything needed to compute one user's period.
#[derive(Debug, Clone, Copy)]
pub struct PayrollInputs<'a> {
    /// The user and salary basis.
    pub personnel: &'a Personnel,
    /// The payroll period.
    pub period: DateRange,
    /// Settings read for this computation.
    pub settings: &'a AttendanceSettings,
    /// Rest day and grace.
    pub rules: &'a AttendanceRules,
    /// Current civil time.
    pub now: NaiveDateTime,
    /// The user's attendance records in the period.
    pub attendance: &'a [AttendanceRecord],
    /// All deduction types.
    pub deduction_types: &'a [DeductionType],
    /// The user's unarchived deduction instances.
    pub deductions: &'a [Deduction],
    /// The user's active loans.
    pub loans: &'a [Loan],
    /// The user's additions.
    pub additions: &'a [Addition],
}

/// Rounds a money amount to cents, midpoint away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Computes the breakdown for one user and period.
///
/// Steps:
///
/// 1. Basis salary is half the monthly basic, whatever the period length.
/// 2. Every working day from the period start up to today (or the period
///    end, if earlier) is resolved and costed. Attendance rates spread the
///    full monthly basic over the period's working days.
/// 3. Standing deductions: every active mandatory type at its live
///    instance's amount (materializing one at the type's amount when the
///    user has none) plus unarchived one-off instances applied within the
///    period.
/// 4. One installment per active loan, capped at the balance.
/// 5. Additions applied within the period.
/// 6. Totals, rounded to cents. Net pay never goes below zero.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::{AttendanceRules, PayrollInputs, aggregate};
/// use payroll_engine::models::{AttendanceSettings, DateRange, Personnel, PersonnelType};
/// use chrono::{NaiveDate, NaiveDateTime};
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
///
/// let personnel = Personnel {
///     user_id: "user_001".to_string(),
///     name: "Maria Santos".to_string(),
///     is_active: true,
///     personnel_type: PersonnelType {
///         id: Uuid::new_v4(),
///         name: "Staff".to_string(),
///         basic_salary: Decimal::new(26000, 0),
///         is_active: true,
///     },
/// };
/// let period = DateRange::new(
///     NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
///     NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
/// )
/// .unwrap();
/// // Before the period starts nothing is deducted yet.
/// let now = NaiveDateTime::parse_from_str("2025-12-31 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
///
/// let breakdown = aggregate(&PayrollInputs {
///     personnel: &personnel,
///     period,
///     settings: &AttendanceSettings::default(),
///     rules: &AttendanceRules::default(),
///     now,
///     attendance: &[],
///     deduction_types: &[],
///     deductions: &[],
///     loans: &[],
///     additions: &[],
/// });
///
/// assert_eq!(breakdown.basis_salary, Decimal::new(13000, 0));
/// assert_eq!(breakdown.totals.net_salary, Decimal::new(1300000, 2));
/// ```
pub fn aggregate(inputs: &PayrollInputs<'_>) -> PayrollBreakdown {
    let user_id = inputs.personnel.user_id.clone();
    let period = inputs.period;
    let monthly_basic = inputs.personnel.monthly_basic();
    let basis_salary = monthly_basic * semi_monthly_factor();
    let working_days_in_period = count_working_days(period, inputs.rules.rest_day);

    let mut audit_trace = Vec::new();
    let mut next_step = {
        let mut counter = 0u32;
        move || {
            counter += 1;
            counter
        }
    };

    audit_trace.push(AuditStep::new(
        next_step(),
        "basis_salary",
        "Semi-Monthly Basis Salary",
        serde_json::json!({
            "monthly_basic": monthly_basic.normalize().to_string(),
            "period_factor": semi_monthly_factor().normalize().to_string(),
        }),
        serde_json::json!({ "basis_salary": basis_salary.normalize().to_string() }),
        format!(
            "${} x {} = ${}",
            monthly_basic.normalize(),
            semi_monthly_factor().normalize(),
            basis_salary.normalize()
        ),
    ));

    audit_trace.push(AuditStep::new(
        next_step(),
        "working_days",
        "Working Days In Period",
        serde_json::json!({
            "period_start": period.start.to_string(),
            "period_end": period.end.to_string(),
            "rest_day": format!("{:?}", inputs.rules.rest_day),
        }),
        serde_json::json!({
            "working_days": working_days_in_period,
            "daily_rate": daily_rate(monthly_basic, working_days_in_period).normalize().to_string(),
        }),
        if working_days_in_period == 0 {
            "No working days in period; attendance rates are zero".to_string()
        } else {
            format!(
                "{} working days excluding {:?}",
                working_days_in_period, inputs.rules.rest_day
            )
        },
    ));

    let days = attendance_lines(inputs, monthly_basic, working_days_in_period);
    let attendance_deductions: Decimal = days.iter().map(|day| day.total_deduction).sum();
    let total_work_hours: Decimal = days.iter().map(|day| day.hours_worked).sum();
    let total_earnings: Decimal = days.iter().map(|day| day.earnings).sum();
    let count = |status: AttendanceStatus| days.iter().filter(|d| d.status == status).count();

    audit_trace.push(AuditStep::new(
        next_step(),
        "attendance_deductions",
        "Attendance Deductions",
        serde_json::json!({
            "days_evaluated": days.len(),
            "computed_at": inputs.now.to_string(),
        }),
        serde_json::json!({
            "present": count(AttendanceStatus::Present),
            "late": count(AttendanceStatus::Late),
            "partial": count(AttendanceStatus::Partial),
            "absent": count(AttendanceStatus::Absent),
            "pending": count(AttendanceStatus::Pending),
            "attendance_deductions": attendance_deductions.normalize().to_string(),
            "total_work_hours": total_work_hours.round_dp(4).normalize().to_string(),
        }),
        format!(
            "{} days evaluated, ${} deducted",
            days.len(),
            round_money(attendance_deductions)
        ),
    ));

    let standing = standing_lines(inputs, basis_salary);
    let standing_total: Decimal = standing.iter().map(|line| line.amount).sum();
    audit_trace.push(AuditStep::new(
        next_step(),
        "standing_deductions",
        "Standing Deductions",
        serde_json::json!({
            "mandatory_types": standing.iter().filter(|l| l.is_mandatory).count(),
            "one_off_instances": standing.iter().filter(|l| !l.is_mandatory).count(),
        }),
        serde_json::json!({
            "materialized": standing.iter().filter(|l| l.materialized).count(),
            "standing_deductions": standing_total.normalize().to_string(),
        }),
        standing
            .iter()
            .map(|line| format!("{} ${}", line.name, line.amount.normalize()))
            .collect::<Vec<_>>()
            .join(", "),
    ));

    let loans = loan_lines(inputs);
    let loan_total: Decimal = loans.iter().map(|line| line.installment).sum();
    audit_trace.push(AuditStep::new(
        next_step(),
        "loan_installments",
        "Loan Installments",
        serde_json::json!({ "active_loans": loans.len() }),
        serde_json::json!({ "loan_deductions": loan_total.normalize().to_string() }),
        format!("{} active loans, ${} due this period", loans.len(), loan_total.normalize()),
    ));

    let additions = addition_lines(inputs);
    let additions_total: Decimal = additions.iter().map(|line| line.amount).sum();
    audit_trace.push(AuditStep::new(
        next_step(),
        "additions",
        "Additions",
        serde_json::json!({ "additions": additions.len() }),
        serde_json::json!({ "total_additions": additions_total.normalize().to_string() }),
        format!("{} additions totalling ${}", additions.len(), additions_total.normalize()),
    ));

    let totals = compute_totals(
        basis_salary,
        attendance_deductions,
        standing_total,
        loan_total,
        additions_total,
        total_work_hours,
        total_earnings,
    );

    audit_trace.push(AuditStep::new(
        next_step(),
        "totals",
        "Gross And Net",
        serde_json::json!({
            "basis_salary": basis_salary.normalize().to_string(),
            "total_additions": totals.total_additions.to_string(),
            "total_deductions": totals.total_deductions.to_string(),
        }),
        serde_json::json!({
            "gross_salary": totals.gross_salary.to_string(),
            "net_salary": totals.net_salary.to_string(),
        }),
        format!(
            "${} - ${} = ${}",
            totals.gross_salary, totals.total_deductions, totals.net_salary
        ),
    ));

    PayrollBreakdown {
        user_id,
        period,
        computed_at: inputs.now,
        monthly_basic,
        basis_salary,
        working_days_in_period,
        days,
        standing_deductions: standing,
        loans,
        additions,
        totals,
        audit_trace,
    }
}

fn compute_totals(
    basis_salary: Decimal,
    attendance_deductions: Decimal,
    standing_deductions: Decimal,
    loan_deductions: Decimal,
    total_additions: Decimal,
    total_work_hours: Decimal,
    total_earnings: Decimal,
) -> PayrollTotals {
    let attendance_deductions = round_money(attendance_deductions);
    let standing_deductions = round_money(standing_deductions);
    let loan_deductions = round_money(loan_deductions);
    let total_additions = round_money(total_additions);

    let gross_salary = round_money(basis_salary + total_additions);
    let total_deductions = attendance_deductions + standing_deductions + loan_deductions;
    let net_salary = (gross_salary - total_deductions).max(Decimal::ZERO);

    PayrollTotals {
        gross_salary,
        attendance_deductions,
        standing_deductions,
        loan_deductions,
        total_deductions,
        total_additions,
        net_salary,
        total_work_hours: total_work_hours.round_dp(2),
        total_earnings: round_money(total_earnings),
    }
}

fn attendance_lines(
    inputs: &PayrollInputs<'_>,
    monthly_basic: Decimal,
    working_days_in_period: u32,
) -> Vec<DayLine> {
    let today = inputs.now.date();
    let Some(evaluated) = inputs.period.clamp_end(today) else {
        return Vec::new();
    };

    working_days(evaluated.start, evaluated.end, inputs.rules.rest_day)
        .into_iter()
        .map(|date| {
            let punches = inputs
                .attendance
                .iter()
                .find(|record| record.date == date && record.user_id == inputs.personnel.user_id)
                .map(AttendanceRecord::punches)
                .unwrap_or_default();
            day_line(inputs, date, punches, monthly_basic, working_days_in_period)
        })
        .collect()
}

fn day_line(
    inputs: &PayrollInputs<'_>,
    date: NaiveDate,
    punches: Punches,
    monthly_basic: Decimal,
    days: u32,
) -> DayLine {
    let settings = inputs.settings;
    let now = inputs.now;
    let status = resolve_status(date, punches, now, settings, inputs.rules);

    let mut line = DayLine {
        date,
        status,
        time_in: punches.time_in,
        time_out: punches.time_out,
        seconds_late: 0,
        seconds_early: 0,
        hours_worked: Decimal::ZERO,
        earnings: Decimal::ZERO,
        late_deduction: Decimal::ZERO,
        early_timeout_deduction: Decimal::ZERO,
        absence_deduction: Decimal::ZERO,
        partial_deduction: Decimal::ZERO,
        total_deduction: Decimal::ZERO,
    };

    match (status, punches.time_in) {
        (AttendanceStatus::Absent, _) => {
            line.absence_deduction = absence_deduction(monthly_basic, days);
        }
        (AttendanceStatus::Partial, Some(time_in)) => {
            // Credited hours stop at the time-out cutoff, or now if earlier.
            let until = settings
                .time_out_end
                .map(|end| end.on(date).min(now))
                .unwrap_or(time_in);
            line.hours_worked = hours_between(time_in, until);
            line.partial_deduction = partial_deduction(
                monthly_basic,
                line.hours_worked,
                Decimal::from(STANDARD_DAILY_HOURS),
                days,
            );
        }
        (AttendanceStatus::Present | AttendanceStatus::Late, Some(time_in)) => {
            line.hours_worked = hours_between(time_in, punches.time_out.unwrap_or(now));
            if status == AttendanceStatus::Late {
                line.seconds_late = seconds_late(time_in, settings);
                if let Some(end) = settings.time_in_end {
                    line.late_deduction = late_deduction(time_in, end.on(date), monthly_basic, days);
                }
            }
            if let (Some(time_out), Some(start)) = (punches.time_out, settings.time_out_start) {
                line.seconds_early = seconds_early(time_out, settings);
                line.early_timeout_deduction =
                    early_timeout_deduction(time_out, start.on(date), monthly_basic, days);
            }
        }
        _ => {}
    }

    line.earnings = line.hours_worked * hourly_rate(monthly_basic, days);
    line.total_deduction = line.late_deduction
        + line.early_timeout_deduction
        + line.absence_deduction
        + line.partial_deduction;
    line
}

fn standing_lines(inputs: &PayrollInputs<'_>, basis_salary: Decimal) -> Vec<StandingLine> {
    let user_id = &inputs.personnel.user_id;
    let live_instances = || {
        inputs
            .deductions
            .iter()
            .filter(move |d| &d.user_id == user_id && !d.is_archived())
    };

    let mut lines: Vec<StandingLine> = inputs
        .deduction_types
        .iter()
        .filter(|deduction_type| deduction_type.applies_every_period())
        .map(|deduction_type| {
            let existing = live_instances().find(|d| d.deduction_type_id == deduction_type.id);
            let amount = match existing {
                Some(instance) => instance.amount.max(Decimal::ZERO),
                None => standing_deduction_amount(deduction_type, basis_salary),
            };
            StandingLine {
                deduction_id: existing.map(|d| d.id).unwrap_or_else(Uuid::new_v4),
                deduction_type_id: deduction_type.id,
                name: deduction_type.name.clone(),
                calculation_type: deduction_type.calculation_type,
                is_mandatory: true,
                amount,
                materialized: existing.is_none(),
            }
        })
        .collect();

    for instance in live_instances() {
        let Some(deduction_type) = inputs
            .deduction_types
            .iter()
            .find(|t| t.id == instance.deduction_type_id)
        else {
            continue;
        };
        if deduction_type.is_mandatory || !deduction_type.is_active {
            continue;
        }
        if !inputs.period.contains(instance.applied_at.date()) {
            continue;
        }
        lines.push(StandingLine {
            deduction_id: instance.id,
            deduction_type_id: deduction_type.id,
            name: deduction_type.name.clone(),
            calculation_type: deduction_type.calculation_type,
            is_mandatory: false,
            amount: instance.amount.max(Decimal::ZERO),
            materialized: false,
        });
    }

    lines
}

fn loan_lines(inputs: &PayrollInputs<'_>) -> Vec<LoanLine> {
    inputs
        .loans
        .iter()
        .filter(|loan| loan.user_id == inputs.personnel.user_id && loan.is_active())
        .map(|loan| {
            let due = installment(loan, semi_monthly_factor());
            LoanLine {
                loan_id: loan.id,
                principal: loan.amount,
                balance_before: loan.balance,
                installment: apply_payment(loan, due).applied,
            }
        })
        .collect()
}

fn addition_lines(inputs: &PayrollInputs<'_>) -> Vec<AdditionLine> {
    inputs
        .additions
        .iter()
        .filter(|addition| {
            addition.user_id == inputs.personnel.user_id
                && inputs.period.contains(addition.applied_at.date())
        })
        .map(|addition| AdditionLine {
            addition_id: addition.id,
            kind: addition.kind,
            description: addition.description.clone(),
            amount: addition.amount.max(Decimal::ZERO),
        })
        .collect()
}
