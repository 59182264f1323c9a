//! Property-based tests for the calculation invariants.

use chrono::{Duration, NaiveDate, NaiveDateTime, Weekday};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use payroll_engine::calculation::{
    AttendanceRules, PayrollInputs, aggregate, apply_payment, daily_rate, hourly_rate,
    is_working_day, late_cap_ratio, late_deduction, per_second_rate, record_payment,
    resolve_status,
};
use payroll_engine::models::{
    AttendanceSettings, AttendanceStatus, CalculationType, DateRange, DeductionType, Loan,
    Personnel, PersonnelType, Punches, TimeOfDay,
};

fn tolerance() -> Decimal {
    Decimal::new(1, 18)
}

/// Monthly salaries from 1,000.00 to 500,000.00.
fn monthly_salary() -> impl Strategy<Value = Decimal> {
    (100_000i64..50_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn working_day_count() -> impl Strategy<Value = u32> {
    1u32..=31
}

/// Any date in 2026.
fn date_2026() -> impl Strategy<Value = NaiveDate> {
    (0i64..365).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + Duration::days(offset)
    })
}

fn time_of_day() -> impl Strategy<Value = TimeOfDay> {
    (0u32..24, 0u32..60).prop_map(|(h, m)| TimeOfDay::from_hm(h, m).unwrap())
}

fn settings_with_cutoffs(time_in_end: TimeOfDay, time_out_end: TimeOfDay) -> AttendanceSettings {
    AttendanceSettings {
        time_in_end: Some(time_in_end),
        time_out_end: Some(time_out_end),
        ..AttendanceSettings::default()
    }
}

fn at(date: NaiveDate, minute_of_day: u32) -> NaiveDateTime {
    date.and_hms_opt(minute_of_day / 60, minute_of_day % 60, 0).unwrap()
}

proptest! {
    // Rest-day properties filter out 6 of every 7 generated dates.
    #![proptest_config(ProptestConfig { max_global_rejects: 8192, ..ProptestConfig::default() })]

    /// Property: hourly × 8 = daily and per-second × 3600 = hourly.
    #[test]
    fn prop_rates_are_consistent(monthly in monthly_salary(), days in working_day_count()) {
        let daily = daily_rate(monthly, days);
        let hourly = hourly_rate(monthly, days);
        let per_second = per_second_rate(monthly, days);

        prop_assert_eq!(daily, monthly / Decimal::from(days));
        prop_assert!((hourly * Decimal::from(8) - daily).abs() < tolerance());
        prop_assert!((per_second * Decimal::from(3600) - hourly).abs() < tolerance());
    }

    /// Property: an absent day in a breakdown costs the monthly basic over the
    /// period's working days, not the semi-monthly basis.
    #[test]
    fn prop_absence_costs_monthly_daily_rate(monthly_cents in 1_000_000i64..10_000_000) {
        let monthly = Decimal::new(monthly_cents, 2);
        let personnel = Personnel {
            user_id: "user_001".to_string(),
            name: "Maria Santos".to_string(),
            is_active: true,
            personnel_type: PersonnelType {
                id: Uuid::new_v4(),
                name: "Staff".to_string(),
                basic_salary: monthly,
                is_active: true,
            },
        };
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let period = DateRange::new(start, start + Duration::days(14)).unwrap();

        let breakdown = aggregate(&PayrollInputs {
            personnel: &personnel,
            period,
            settings: &AttendanceSettings::default(),
            rules: &AttendanceRules::default(),
            now: at(start + Duration::days(1), 10 * 60),
            attendance: &[],
            deduction_types: &[],
            deductions: &[],
            loans: &[],
            additions: &[],
        });

        prop_assert_eq!(breakdown.working_days_in_period, 13);
        prop_assert_eq!(breakdown.days[0].status, AttendanceStatus::Absent);
        prop_assert_eq!(breakdown.days[0].absence_deduction, monthly / Decimal::from(13));
    }

    /// Property: a late deduction is never negative and never above half a day.
    #[test]
    fn prop_late_deduction_is_capped(
        monthly in monthly_salary(),
        days in working_day_count(),
        offset_secs in -7_200i64..43_200,
    ) {
        let expected = NaiveDate::from_ymd_opt(2026, 1, 5)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let time_in = expected + Duration::seconds(offset_secs);

        let deduction = late_deduction(time_in, expected, monthly, days);
        let cap = daily_rate(monthly, days) * late_cap_ratio();

        prop_assert!(deduction >= Decimal::ZERO);
        prop_assert!(deduction <= cap);
    }

    /// Property: the rest day is non-working whatever was punched.
    #[test]
    fn prop_rest_day_is_always_non_working(
        date in date_2026(),
        punch_minute in 0u32..1440,
        cutoff_in in time_of_day(),
        cutoff_out in time_of_day(),
    ) {
        let rules = AttendanceRules::default();
        prop_assume!(!is_working_day(date, rules.rest_day));

        let punches = Punches {
            time_in: Some(at(date, punch_minute)),
            time_out: None,
        };
        let now = at(date, 23 * 60);
        let settings = settings_with_cutoffs(cutoff_in, cutoff_out);

        prop_assert_eq!(
            resolve_status(date, punches, now, &settings, &rules),
            AttendanceStatus::NonWorking
        );
    }

    /// Property: a past working day without a time-in is absent.
    #[test]
    fn prop_past_day_without_punch_is_absent(
        date in date_2026(),
        days_later in 1i64..60,
        cutoff_in in time_of_day(),
    ) {
        let rules = AttendanceRules::default();
        prop_assume!(is_working_day(date, rules.rest_day));

        let now = at(date + Duration::days(days_later), 8 * 60);
        let settings = AttendanceSettings {
            time_in_end: Some(cutoff_in),
            ..AttendanceSettings::default()
        };

        prop_assert_eq!(
            resolve_status(date, Punches::default(), now, &settings, &rules),
            AttendanceStatus::Absent
        );
    }

    /// Property: re-resolving a status with the same inputs gives the same answer.
    #[test]
    fn prop_status_resolution_is_stable(
        date in date_2026(),
        time_in_minute in proptest::option::of(0u32..1440),
        worked_minutes in proptest::option::of(1u32..600),
        now_offset_minutes in -1440i64..2880,
        cutoff_in in time_of_day(),
        cutoff_out in time_of_day(),
    ) {
        let rules = AttendanceRules {
            rest_day: Weekday::Sun,
            late_grace_minutes: 1,
        };
        let time_in = time_in_minute.map(|m| at(date, m));
        let time_out = time_in
            .zip(worked_minutes)
            .map(|(t, w)| t + Duration::minutes(i64::from(w)));
        let punches = Punches { time_in, time_out };
        let now = at(date, 12 * 60) + Duration::minutes(now_offset_minutes);
        let settings = settings_with_cutoffs(cutoff_in, cutoff_out);

        let first = resolve_status(date, punches, now, &settings, &rules);
        let second = resolve_status(date, punches, now, &settings, &rules);
        prop_assert_eq!(first, second);

        if first.attended() {
            prop_assert!(time_in.is_some());
        }
    }

    /// Property: loan balances only go down, never below zero, and complete once.
    #[test]
    fn prop_loan_balance_is_monotone(
        principal_cents in 100_000i64..10_000_000,
        installments in prop::collection::vec(0i64..500_000, 1..40),
    ) {
        let mut loan = Loan::new(
            "user_001",
            Decimal::new(principal_cents, 2),
            Decimal::from(20),
            5,
        );
        let at = NaiveDate::from_ymd_opt(2026, 1, 15)
            .unwrap()
            .and_hms_opt(17, 0, 0)
            .unwrap();

        let mut completions = 0;
        for cents in installments {
            let before = loan.balance;
            let installment = Decimal::new(cents, 2);

            let preview = apply_payment(&loan, installment);
            prop_assert!(preview.applied <= before);

            if let Some(payment) = record_payment(&mut loan, installment, at) {
                prop_assert_eq!(payment, preview);
                if payment.completed {
                    completions += 1;
                }
            }
            prop_assert!(loan.balance <= before);
            prop_assert!(loan.balance >= Decimal::ZERO);
        }

        prop_assert!(completions <= 1);
        prop_assert_eq!(completions == 1, loan.balance.is_zero());
    }

    /// Property: net pay is never negative, however large the deductions.
    #[test]
    fn prop_net_salary_never_negative(
        monthly_cents in 1_000_000i64..10_000_000,
        fixed_cents in 0i64..100_000_000,
        absent_until in 0i64..15,
    ) {
        let personnel = Personnel {
            user_id: "user_001".to_string(),
            name: "Maria Santos".to_string(),
            is_active: true,
            personnel_type: PersonnelType {
                id: Uuid::new_v4(),
                name: "Staff".to_string(),
                basic_salary: Decimal::new(monthly_cents, 2),
                is_active: true,
            },
        };
        let levy = DeductionType {
            id: Uuid::new_v4(),
            name: "Levy".to_string(),
            calculation_type: CalculationType::Fixed,
            amount: Some(Decimal::new(fixed_cents, 2)),
            percentage_value: None,
            is_mandatory: true,
            is_active: true,
        };
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let period = DateRange::new(start, start + Duration::days(14)).unwrap();
        let now = at(start + Duration::days(absent_until), 23 * 60);
        let deduction_types = [levy];

        let breakdown = aggregate(&PayrollInputs {
            personnel: &personnel,
            period,
            settings: &AttendanceSettings::default(),
            rules: &AttendanceRules::default(),
            now,
            attendance: &[],
            deduction_types: &deduction_types,
            deductions: &[],
            loans: &[],
            additions: &[],
        });

        prop_assert!(breakdown.totals.net_salary >= Decimal::ZERO);
        prop_assert!(breakdown.totals.net_salary <= breakdown.totals.gross_salary);
    }
}
