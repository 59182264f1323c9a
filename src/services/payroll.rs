//! Payroll preview, generation, release and entry reads.
//!
//! Lifecycle of an entry: generation creates it PENDING and archives any
//! entry still live for the same user, release freezes it as RELEASED with a
//! snapshot, and a later generation archives it. Reads of released and
//! archived entries come from the snapshot; pending entries recompute.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::conflict_as;
use crate::calculation::{
    AttendanceRules, PayrollInputs, aggregate, count_working_days, record_payment,
    semi_monthly_factor, standing_deduction_amount,
};
use crate::clock::Clock;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceSettings, BreakdownSnapshot, DateRange, Deduction, PayrollBreakdown, PayrollEntry,
    PayrollStatus, Personnel,
};
use crate::store::{EntryRelease, GenerationCommit, ReleaseCommit, Repository};

/// What one generation wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// The period generated.
    pub period: DateRange,
    /// The new pending entries.
    pub entries: Vec<PayrollEntry>,
    /// Live entries archived in the process.
    pub archived_entries: usize,
    /// Mandatory deduction instances created for the first time.
    pub materialized_deductions: usize,
}

/// What one release wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseReport {
    /// The period released.
    pub period: DateRange,
    /// Entries released.
    pub released_entries: Vec<Uuid>,
    /// Loans that received an installment.
    pub loans_charged: usize,
    /// Loans completed by this release.
    pub loans_completed: usize,
    /// One-off deductions archived.
    pub deductions_archived: usize,
    /// The new active period.
    pub next_period: DateRange,
}

/// An entry together with the breakdown a reader should see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollEntryView {
    /// The stored entry.
    pub entry: PayrollEntry,
    /// Live computation for pending entries, the frozen snapshot otherwise.
    pub breakdown: PayrollBreakdown,
    /// True when `breakdown` was recomputed for this read.
    pub live: bool,
}

/// A request to apply a deduction to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyDeduction {
    /// The user.
    pub user_id: String,
    /// The deduction type.
    pub deduction_type_id: Uuid,
    /// Explicit amount; defaults to the type's configured amount.
    #[serde(default)]
    pub amount: Option<Decimal>,
}

/// Payroll operations over a store and a clock.
pub struct PayrollService {
    repo: Arc<dyn Repository>,
    clock: Arc<dyn Clock>,
    rules: AttendanceRules,
}

impl PayrollService {
    /// Creates the service.
    pub fn new(repo: Arc<dyn Repository>, clock: Arc<dyn Clock>, rules: AttendanceRules) -> Self {
        Self { repo, clock, rules }
    }

    fn compute(
        &self,
        personnel: &Personnel,
        period: DateRange,
        settings: &AttendanceSettings,
        now: NaiveDateTime,
    ) -> EngineResult<PayrollBreakdown> {
        let user_id = personnel.user_id.as_str();
        let attendance = self.repo.list_attendance(Some(user_id), period)?;
        let deduction_types = self.repo.list_deduction_types(None)?;
        let deductions = self.repo.list_deductions(user_id, None, false)?;
        let loans = self.repo.list_active_loans(Some(user_id))?;
        let additions = self.repo.list_additions(user_id, period)?;

        Ok(aggregate(&PayrollInputs {
            personnel,
            period,
            settings,
            rules: &self.rules,
            now,
            attendance: &attendance,
            deduction_types: &deduction_types,
            deductions: &deductions,
            loans: &loans,
            additions: &additions,
        }))
    }

    fn active_period(&self, settings: &AttendanceSettings) -> EngineResult<DateRange> {
        let period = settings.active_period()?;
        if count_working_days(period, self.rules.rest_day) == 0 {
            return Err(EngineError::configuration(format!(
                "no working days in period {}",
                period
            )));
        }
        Ok(period)
    }

    /// Live breakdown for one user over the active period.
    ///
    /// Nothing is persisted.
    pub fn preview(&self, user_id: &str) -> EngineResult<PayrollBreakdown> {
        let settings = self.repo.get_settings()?;
        let period = settings.active_period()?;
        let personnel = self
            .repo
            .find_personnel(user_id)?
            .ok_or_else(|| EngineError::not_found("Personnel", user_id))?;
        self.compute(&personnel, period, &settings, self.clock.civil_now())
    }

    /// Creates a pending entry for every active user in the active period.
    ///
    /// Entries still live for those users are archived in the same commit,
    /// keeping their last snapshot. Mandatory deductions a user does not
    /// have yet are persisted.
    pub fn generate(&self) -> EngineResult<GenerationReport> {
        let settings = self.repo.get_settings()?;
        let period = self.active_period(&settings)?;
        let now = self.clock.civil_now();

        let personnel = self.repo.list_active_personnel()?;
        let live_entries: Vec<PayrollEntry> = self
            .repo
            .list_payroll_entries(None, None)?
            .into_iter()
            .filter(PayrollEntry::is_live)
            .collect();

        let mut commit = GenerationCommit {
            archived_at: Some(now),
            ..GenerationCommit::default()
        };
        for person in &personnel {
            let breakdown = self.compute(person, period, &settings, now)?;

            commit.new_deductions.extend(
                breakdown
                    .standing_deductions
                    .iter()
                    .filter(|line| line.materialized)
                    .map(|line| Deduction {
                        id: line.deduction_id,
                        user_id: person.user_id.clone(),
                        deduction_type_id: line.deduction_type_id,
                        amount: line.amount,
                        applied_at: now,
                        archived_at: None,
                    }),
            );
            commit.archive_entry_ids.extend(
                live_entries
                    .iter()
                    .filter(|entry| entry.user_id == person.user_id)
                    .map(|entry| entry.id),
            );
            commit.entries.push(PayrollEntry::pending(breakdown, now));
        }

        let report = GenerationReport {
            period,
            entries: commit.entries.clone(),
            archived_entries: commit.archive_entry_ids.len(),
            materialized_deductions: commit.new_deductions.len(),
        };

        self.repo.commit_generation(commit).map_err(|e| {
            conflict_as(e, || {
                "payroll changed while generating; run generation again".to_string()
            })
        })?;

        tracing::info!(
            period_start = %period.start,
            period_end = %period.end,
            entries = report.entries.len(),
            archived = report.archived_entries,
            materialized = report.materialized_deductions,
            "Payroll generated"
        );

        Ok(report)
    }

    /// Releases every pending entry of the active period.
    ///
    /// Each entry is recomputed one last time and frozen. In the same
    /// commit, loan installments are applied, consumed one-off deductions
    /// are archived and the settings move to `next_period`.
    pub fn release(&self, next_period: DateRange) -> EngineResult<ReleaseReport> {
        let mut settings = self.repo.get_settings()?;
        let period = self.active_period(&settings)?;
        let now = self.clock.civil_now();

        if next_period.start <= period.end {
            return Err(EngineError::InvalidSettings {
                field: "period_start".to_string(),
                message: format!(
                    "next period must start after the current period ends on {}",
                    period.end
                ),
            });
        }

        let pending = self
            .repo
            .list_payroll_entries(Some(period), Some(PayrollStatus::Pending))?;
        if pending.is_empty() {
            return Err(EngineError::conflict(format!(
                "no pending payroll entries for period {}; generate payroll first",
                period
            )));
        }

        let mut loans: HashMap<Uuid, _> = self
            .repo
            .list_active_loans(None)?
            .into_iter()
            .map(|loan| (loan.id, loan))
            .collect();

        let mut releases = Vec::with_capacity(pending.len());
        let mut charged = Vec::new();
        let mut archive_deduction_ids = Vec::new();
        let mut loans_completed = 0;

        for entry in &pending {
            let breakdown = match self.repo.find_personnel(&entry.user_id)? {
                Some(personnel) => self.compute(&personnel, period, &settings, now)?,
                None => match &entry.breakdown_snapshot {
                    Some(snapshot) => snapshot.breakdown().clone(),
                    None => return Err(EngineError::not_found("Personnel", &entry.user_id)),
                },
            };

            for line in &breakdown.loans {
                if let Some(loan) = loans.get_mut(&line.loan_id) {
                    if let Some(payment) = record_payment(loan, line.installment, now) {
                        if payment.completed {
                            loans_completed += 1;
                        }
                        charged.push(line.loan_id);
                    }
                }
            }
            archive_deduction_ids.extend(
                breakdown
                    .standing_deductions
                    .iter()
                    .filter(|line| !line.is_mandatory)
                    .map(|line| line.deduction_id),
            );

            releases.push(EntryRelease {
                entry_id: entry.id,
                basic_salary: breakdown.totals.gross_salary,
                deductions: breakdown.totals.total_deductions,
                net_pay: breakdown.totals.net_salary,
                snapshot: BreakdownSnapshot::freeze(breakdown),
            });
        }

        let loan_updates = charged
            .iter()
            .filter_map(|id| loans.get(id).cloned())
            .collect();
        settings.advance_to(next_period);

        let report = ReleaseReport {
            period,
            released_entries: releases.iter().map(|r| r.entry_id).collect(),
            loans_charged: charged.len(),
            loans_completed,
            deductions_archived: archive_deduction_ids.len(),
            next_period,
        };

        self.repo
            .commit_release(ReleaseCommit {
                releases,
                loan_updates,
                archive_deduction_ids,
                released_at: now,
                settings,
            })
            .map_err(|e| {
                conflict_as(e, || {
                    format!("payroll for period {} was already released", period)
                })
            })?;

        tracing::info!(
            period_start = %period.start,
            period_end = %period.end,
            entries = report.released_entries.len(),
            loans_charged = report.loans_charged,
            loans_completed = report.loans_completed,
            next_period_start = %next_period.start,
            "Payroll released"
        );

        Ok(report)
    }

    /// Reads an entry with the breakdown a reader should see.
    pub fn entry_view(&self, id: Uuid) -> EngineResult<PayrollEntryView> {
        let entry = self
            .repo
            .find_payroll_entry(id)?
            .ok_or_else(|| EngineError::not_found("Payroll entry", id))?;

        if entry.status == PayrollStatus::Pending {
            if let Some(personnel) = self.repo.find_personnel(&entry.user_id)? {
                let settings = self.repo.get_settings()?;
                let breakdown =
                    self.compute(&personnel, entry.period, &settings, self.clock.civil_now())?;
                return Ok(PayrollEntryView {
                    entry,
                    breakdown,
                    live: true,
                });
            }
        }

        let breakdown = entry
            .breakdown_snapshot
            .as_ref()
            .map(|snapshot| snapshot.breakdown().clone())
            .ok_or_else(|| EngineError::not_found("Payroll snapshot", id))?;
        Ok(PayrollEntryView {
            entry,
            breakdown,
            live: false,
        })
    }

    /// Applies a deduction to one user.
    ///
    /// Without an explicit amount the type's configured amount is used,
    /// with percentage types taken of the semi-monthly basis. A second live
    /// instance of a mandatory type is a conflict.
    pub fn apply_deduction(&self, request: ApplyDeduction) -> EngineResult<Deduction> {
        let deduction_type = self
            .repo
            .list_deduction_types(None)?
            .into_iter()
            .find(|t| t.id == request.deduction_type_id)
            .ok_or_else(|| EngineError::not_found("Deduction type", request.deduction_type_id))?;
        if !deduction_type.is_active {
            return Err(EngineError::conflict(format!(
                "deduction type {} is inactive",
                deduction_type.name
            )));
        }
        let personnel = self
            .repo
            .find_personnel(&request.user_id)?
            .ok_or_else(|| EngineError::not_found("Personnel", &request.user_id))?;

        let basis = personnel.monthly_basic() * semi_monthly_factor();
        let amount = request
            .amount
            .unwrap_or_else(|| standing_deduction_amount(&deduction_type, basis))
            .max(Decimal::ZERO);
        let deduction = Deduction::new(
            &request.user_id,
            deduction_type.id,
            amount,
            self.clock.civil_now(),
        );

        self.repo.create_deduction(deduction.clone()).map_err(|e| {
            conflict_as(e, || {
                format!(
                    "{} is mandatory and already applied to {}",
                    deduction_type.name, request.user_id
                )
            })
        })?;

        tracing::info!(
            user_id = %request.user_id,
            deduction_type = %deduction_type.name,
            amount = %amount,
            "Deduction applied"
        );
        Ok(deduction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{
        AttendanceRecord, AttendanceStatus, CalculationType, DeductionType, Loan, LoanStatus,
        PersonnelType,
    };
    use crate::store::InMemoryRepository;
    use chrono::{FixedOffset, NaiveDate};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn make_datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::new(make_date(start), make_date(end)).unwrap()
    }

    struct Harness {
        repo: Arc<InMemoryRepository>,
        clock: Arc<FixedClock>,
        service: PayrollService,
    }

    fn harness(now: &str) -> Harness {
        let repo = Arc::new(InMemoryRepository::with_settings(AttendanceSettings {
            time_in_start: Some("07:00".parse().unwrap()),
            time_in_end: Some("09:30".parse().unwrap()),
            time_out_start: Some("16:00".parse().unwrap()),
            time_out_end: Some("17:00".parse().unwrap()),
            period_start: Some(make_date("2026-01-01")),
            period_end: Some(make_date("2026-01-15")),
            ..AttendanceSettings::default()
        }));
        repo.insert_personnel(Personnel {
            user_id: "user_001".to_string(),
            name: "Maria Santos".to_string(),
            is_active: true,
            personnel_type: PersonnelType {
                id: Uuid::new_v4(),
                name: "Staff".to_string(),
                basic_salary: dec("26000"),
                is_active: true,
            },
        })
        .unwrap();
        let clock = Arc::new(FixedClock::at(
            make_datetime(now),
            FixedOffset::east_opt(8 * 3600).unwrap(),
        ));
        let service = PayrollService::new(repo.clone(), clock.clone(), AttendanceRules::default());
        Harness {
            repo,
            clock,
            service,
        }
    }

    #[test]
    fn test_generate_without_period_is_configuration_error() {
        let h = harness("2026-01-15 18:00:00");
        h.repo.save_settings(&AttendanceSettings::default()).unwrap();
        assert!(matches!(h.service.generate(), Err(EngineError::Configuration { .. })));
        assert!(h.repo.list_payroll_entries(None, None).unwrap().is_empty());
    }

    #[test]
    fn test_generate_with_no_working_days_is_configuration_error() {
        let h = harness("2026-01-15 18:00:00");
        let mut settings = h.repo.get_settings().unwrap();
        settings.period_start = Some(make_date("2026-01-04"));
        settings.period_end = Some(make_date("2026-01-04"));
        h.repo.save_settings(&settings).unwrap();
        match h.service.generate() {
            Err(EngineError::Configuration { message }) => {
                assert!(message.contains("no working days"))
            }
            other => panic!("Expected Configuration, got {:?}", other),
        }
    }

    #[test]
    fn test_second_generation_archives_first() {
        let h = harness("2026-01-15 18:00:00");
        let first = h.service.generate().unwrap();
        let second = h.service.generate().unwrap();
        assert_eq!(second.archived_entries, 1);

        let entries = h.repo.list_payroll_entries(None, None).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.iter().filter(|e| e.is_live()).count(), 1);

        let old = h.repo.find_payroll_entry(first.entries[0].id).unwrap().unwrap();
        assert_eq!(old.status, PayrollStatus::Archived);
        assert!(old.breakdown_snapshot.is_some());
    }

    #[test]
    fn test_mandatory_deduction_materialized_once() {
        let h = harness("2026-01-15 18:00:00");
        let sss = DeductionType {
            id: Uuid::new_v4(),
            name: "SSS".to_string(),
            calculation_type: CalculationType::Fixed,
            amount: Some(dec("500")),
            percentage_value: None,
            is_mandatory: true,
            is_active: true,
        };
        h.repo.insert_deduction_type(sss.clone()).unwrap();

        assert_eq!(h.service.generate().unwrap().materialized_deductions, 1);
        assert_eq!(h.service.generate().unwrap().materialized_deductions, 0);
        assert_eq!(h.repo.list_deductions("user_001", None, false).unwrap().len(), 1);

        let again = h.service.apply_deduction(ApplyDeduction {
            user_id: "user_001".to_string(),
            deduction_type_id: sss.id,
            amount: None,
        });
        assert!(matches!(again, Err(EngineError::Conflict { .. })));
    }

    #[test]
    fn test_explicit_mandatory_amount_flows_into_preview() {
        let h = harness("2025-12-31 12:00:00");
        let levy = DeductionType {
            id: Uuid::new_v4(),
            name: "Union Levy".to_string(),
            calculation_type: CalculationType::Fixed,
            amount: Some(dec("250")),
            percentage_value: None,
            is_mandatory: true,
            is_active: true,
        };
        h.repo.insert_deduction_type(levy.clone()).unwrap();

        let applied = h
            .service
            .apply_deduction(ApplyDeduction {
                user_id: "user_001".to_string(),
                deduction_type_id: levy.id,
                amount: Some(dec("500")),
            })
            .unwrap();
        assert_eq!(applied.amount, dec("500"));

        let breakdown = h.service.preview("user_001").unwrap();
        assert_eq!(breakdown.standing_deductions[0].deduction_id, applied.id);
        assert_eq!(breakdown.totals.standing_deductions, dec("500.00"));
        assert_eq!(breakdown.totals.net_salary, dec("12500.00"));
    }

    #[test]
    fn test_release_without_pending_is_conflict() {
        let h = harness("2026-01-15 18:00:00");
        let result = h.service.release(range("2026-01-16", "2026-01-31"));
        assert!(matches!(result, Err(EngineError::Conflict { .. })));
    }

    #[test]
    fn test_release_rejects_overlapping_next_period() {
        let h = harness("2026-01-15 18:00:00");
        h.service.generate().unwrap();
        let result = h.service.release(range("2026-01-10", "2026-01-31"));
        assert!(matches!(result, Err(EngineError::InvalidSettings { .. })));
    }

    #[test]
    fn test_release_freezes_and_advances() {
        let h = harness("2026-01-15 18:00:00");
        let loan = Loan::new("user_001", dec("12000"), dec("20"), 10);
        h.repo.insert_loan(loan.clone()).unwrap();
        let generated = h.service.generate().unwrap();
        let entry_id = generated.entries[0].id;

        let report = h.service.release(range("2026-01-16", "2026-01-31")).unwrap();
        assert_eq!(report.released_entries, vec![entry_id]);
        assert_eq!(report.loans_charged, 1);

        let stored_loan = h.repo.loan(loan.id).unwrap().unwrap();
        assert_eq!(stored_loan.balance, dec("10800"));
        assert_eq!(stored_loan.status, LoanStatus::Active);

        let settings = h.repo.get_settings().unwrap();
        assert_eq!(settings.period_start, Some(make_date("2026-01-16")));

        let view = h.service.entry_view(entry_id).unwrap();
        assert!(!view.live);
        assert_eq!(view.entry.status, PayrollStatus::Released);
        let net_at_release = view.breakdown.totals.net_salary;

        // Editing attendance and settings afterwards changes nothing.
        h.repo
            .insert_attendance(AttendanceRecord::new(
                "user_001",
                make_date("2026-01-05"),
                AttendanceStatus::Present,
            ))
            .ok();
        let mut edited = h.repo.get_settings().unwrap();
        edited.time_in_end = Some("07:30".parse().unwrap());
        h.repo.save_settings(&edited).unwrap();
        h.clock.set(make_datetime("2026-02-01 12:00:00"));

        let reread = h.service.entry_view(entry_id).unwrap();
        assert_eq!(reread.breakdown.totals.net_salary, net_at_release);
        assert_eq!(reread.entry.net_pay, net_at_release);
    }

    #[test]
    fn test_pending_entry_view_recomputes() {
        let h = harness("2026-01-05 08:00:00");
        let generated = h.service.generate().unwrap();
        let entry_id = generated.entries[0].id;
        let at_generation = generated.entries[0].net_pay;

        h.clock.set(make_datetime("2026-01-06 08:00:00"));
        let view = h.service.entry_view(entry_id).unwrap();
        assert!(view.live);
        // Monday the 5th became a past day without a punch.
        assert!(view.breakdown.totals.net_salary < at_generation);
    }

    #[test]
    fn test_one_off_deduction_archived_at_release() {
        let h = harness("2026-01-15 18:00:00");
        let uniform = DeductionType {
            id: Uuid::new_v4(),
            name: "Uniform".to_string(),
            calculation_type: CalculationType::Fixed,
            amount: Some(dec("300")),
            percentage_value: None,
            is_mandatory: false,
            is_active: true,
        };
        h.repo.insert_deduction_type(uniform.clone()).unwrap();
        let applied = h
            .service
            .apply_deduction(ApplyDeduction {
                user_id: "user_001".to_string(),
                deduction_type_id: uniform.id,
                amount: None,
            })
            .unwrap();
        assert_eq!(applied.amount, dec("300"));

        h.service.generate().unwrap();
        let report = h.service.release(range("2026-01-16", "2026-01-31")).unwrap();
        assert_eq!(report.deductions_archived, 1);
        assert!(h.repo.deduction(applied.id).unwrap().unwrap().is_archived());
    }

    #[test]
    fn test_preview_unknown_user_is_not_found() {
        let h = harness("2026-01-15 18:00:00");
        assert!(matches!(h.service.preview("ghost"), Err(EngineError::NotFound { .. })));
    }
}
