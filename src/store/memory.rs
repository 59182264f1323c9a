//! In-process [`Repository`] backed by a single lock.
//!
//! Used by tests, benchmarks and embedders that keep their own persistence.
//! Every trait call takes the lock once, so validation and writes of a
//! commit happen under the same guard.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use uuid::Uuid;

use super::{GenerationCommit, ReleaseCommit, Repository, StoreError, StoreResult};
use crate::models::{
    Addition, AttendanceRecord, AttendanceSettings, DateRange, Deduction, DeductionType, Loan,
    PayrollEntry, PayrollStatus, Personnel, Punches,
};

#[derive(Debug, Default)]
struct State {
    settings: AttendanceSettings,
    attendance: BTreeMap<(String, NaiveDate), AttendanceRecord>,
    deduction_types: Vec<DeductionType>,
    deductions: Vec<Deduction>,
    additions: Vec<Addition>,
    loans: Vec<Loan>,
    payroll_entries: Vec<PayrollEntry>,
    personnel: Vec<Personnel>,
}

impl State {
    fn is_mandatory_type(&self, type_id: Uuid) -> bool {
        self.deduction_types
            .iter()
            .any(|t| t.id == type_id && t.is_mandatory)
    }

    fn check_mandatory_unique(&self, deduction: &Deduction) -> StoreResult<()> {
        if !self.is_mandatory_type(deduction.deduction_type_id) {
            return Ok(());
        }
        let duplicate = self.deductions.iter().any(|existing| {
            existing.user_id == deduction.user_id
                && existing.deduction_type_id == deduction.deduction_type_id
                && !existing.is_archived()
        });
        if duplicate {
            return Err(StoreError::conflict(
                "deduction",
                format!("{}/{}", deduction.user_id, deduction.deduction_type_id),
            ));
        }
        Ok(())
    }

    fn entry_index(&self, id: Uuid) -> StoreResult<usize> {
        self.payroll_entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or_else(|| StoreError::not_found("payroll entry", id))
    }
}

/// A [`Repository`] held entirely in memory.
///
/// # Example
///
/// ```
/// use payroll_engine::store::{InMemoryRepository, Repository};
/// use payroll_engine::models::{AttendanceRecord, AttendanceStatus};
/// use chrono::NaiveDate;
///
/// let repo = InMemoryRepository::new();
/// let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
///
/// repo.insert_attendance(AttendanceRecord::new("user_001", date, AttendanceStatus::Absent))
///     .unwrap();
/// let duplicate = repo.insert_attendance(AttendanceRecord::new("user_001", date, AttendanceStatus::Absent));
/// assert!(duplicate.is_err());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    state: RwLock<State>,
}

impl InMemoryRepository {
    /// Creates an empty store with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with the given settings.
    pub fn with_settings(settings: AttendanceSettings) -> Self {
        Self {
            state: RwLock::new(State {
                settings,
                ..State::default()
            }),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state.read().map_err(|_| StoreError::Unavailable {
            message: "state lock poisoned".to_string(),
        })
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state.write().map_err(|_| StoreError::Unavailable {
            message: "state lock poisoned".to_string(),
        })
    }

    /// Adds or replaces a personnel record.
    pub fn insert_personnel(&self, personnel: Personnel) -> StoreResult<()> {
        let mut state = self.write()?;
        state.personnel.retain(|p| p.user_id != personnel.user_id);
        state.personnel.push(personnel);
        Ok(())
    }

    /// Adds a deduction type.
    pub fn insert_deduction_type(&self, deduction_type: DeductionType) -> StoreResult<()> {
        self.write()?.deduction_types.push(deduction_type);
        Ok(())
    }

    /// Adds a loan.
    pub fn insert_loan(&self, loan: Loan) -> StoreResult<()> {
        self.write()?.loans.push(loan);
        Ok(())
    }

    /// Adds an addition.
    pub fn insert_addition(&self, addition: Addition) -> StoreResult<()> {
        self.write()?.additions.push(addition);
        Ok(())
    }

    /// Reads a loan in any status.
    pub fn loan(&self, id: Uuid) -> StoreResult<Option<Loan>> {
        Ok(self.read()?.loans.iter().find(|l| l.id == id).cloned())
    }

    /// Reads a deduction instance, archived or not.
    pub fn deduction(&self, id: Uuid) -> StoreResult<Option<Deduction>> {
        Ok(self.read()?.deductions.iter().find(|d| d.id == id).cloned())
    }
}

impl Repository for InMemoryRepository {
    fn get_settings(&self) -> StoreResult<AttendanceSettings> {
        Ok(self.read()?.settings.clone())
    }

    fn save_settings(&self, settings: &AttendanceSettings) -> StoreResult<()> {
        self.write()?.settings = settings.clone();
        Ok(())
    }

    fn find_attendance(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>> {
        Ok(self
            .read()?
            .attendance
            .get(&(user_id.to_string(), date))
            .cloned())
    }

    fn insert_attendance(&self, record: AttendanceRecord) -> StoreResult<()> {
        let mut state = self.write()?;
        let key = (record.user_id.clone(), record.date);
        if state.attendance.contains_key(&key) {
            return Err(StoreError::conflict(
                "attendance",
                format!("{}/{}", record.user_id, record.date),
            ));
        }
        state.attendance.insert(key, record);
        Ok(())
    }

    fn update_attendance(&self, record: &AttendanceRecord, expected: Punches) -> StoreResult<()> {
        let mut state = self.write()?;
        let key = (record.user_id.clone(), record.date);
        match state.attendance.get_mut(&key) {
            Some(existing) if existing.punches() != expected => Err(StoreError::conflict(
                "attendance",
                format!("{}/{}", record.user_id, record.date),
            )),
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(StoreError::not_found(
                "attendance",
                format!("{}/{}", record.user_id, record.date),
            )),
        }
    }

    fn list_attendance(
        &self,
        user_id: Option<&str>,
        range: DateRange,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        Ok(self
            .read()?
            .attendance
            .values()
            .filter(|r| user_id.is_none_or(|u| r.user_id == u) && range.contains(r.date))
            .cloned()
            .collect())
    }

    fn delete_attendance(&self, user_id: Option<&str>, range: DateRange) -> StoreResult<usize> {
        let mut state = self.write()?;
        let before = state.attendance.len();
        state
            .attendance
            .retain(|(user, date), _| !(user_id.is_none_or(|u| user == u) && range.contains(*date)));
        Ok(before - state.attendance.len())
    }

    fn list_deduction_types(&self, mandatory: Option<bool>) -> StoreResult<Vec<DeductionType>> {
        Ok(self
            .read()?
            .deduction_types
            .iter()
            .filter(|t| mandatory.is_none_or(|m| t.is_mandatory == m))
            .cloned()
            .collect())
    }

    fn list_deductions(
        &self,
        user_id: &str,
        period: Option<DateRange>,
        include_archived: bool,
    ) -> StoreResult<Vec<Deduction>> {
        Ok(self
            .read()?
            .deductions
            .iter()
            .filter(|d| d.user_id == user_id)
            .filter(|d| include_archived || !d.is_archived())
            .filter(|d| period.is_none_or(|p| p.contains(d.applied_at.date())))
            .cloned()
            .collect())
    }

    fn create_deduction(&self, deduction: Deduction) -> StoreResult<()> {
        let mut state = self.write()?;
        state.check_mandatory_unique(&deduction)?;
        state.deductions.push(deduction);
        Ok(())
    }

    fn list_additions(&self, user_id: &str, period: DateRange) -> StoreResult<Vec<Addition>> {
        Ok(self
            .read()?
            .additions
            .iter()
            .filter(|a| a.user_id == user_id && period.contains(a.applied_at.date()))
            .cloned()
            .collect())
    }

    fn list_active_loans(&self, user_id: Option<&str>) -> StoreResult<Vec<Loan>> {
        Ok(self
            .read()?
            .loans
            .iter()
            .filter(|l| l.is_active() && user_id.is_none_or(|u| l.user_id == u))
            .cloned()
            .collect())
    }

    fn list_payroll_entries(
        &self,
        period: Option<DateRange>,
        status: Option<PayrollStatus>,
    ) -> StoreResult<Vec<PayrollEntry>> {
        Ok(self
            .read()?
            .payroll_entries
            .iter()
            .filter(|e| period.is_none_or(|p| e.period == p))
            .filter(|e| status.is_none_or(|s| e.status == s))
            .cloned()
            .collect())
    }

    fn find_payroll_entry(&self, id: Uuid) -> StoreResult<Option<PayrollEntry>> {
        Ok(self
            .read()?
            .payroll_entries
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    fn list_active_personnel(&self) -> StoreResult<Vec<Personnel>> {
        Ok(self
            .read()?
            .personnel
            .iter()
            .filter(|p| p.is_on_payroll())
            .cloned()
            .collect())
    }

    fn find_personnel(&self, user_id: &str) -> StoreResult<Option<Personnel>> {
        Ok(self
            .read()?
            .personnel
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    fn commit_generation(&self, commit: GenerationCommit) -> StoreResult<()> {
        let mut state = self.write()?;

        let mut archive_indices = Vec::with_capacity(commit.archive_entry_ids.len());
        for id in &commit.archive_entry_ids {
            let index = state.entry_index(*id)?;
            if !state.payroll_entries[index].is_live() {
                return Err(StoreError::conflict("payroll entry", id));
            }
            archive_indices.push(index);
        }
        for (position, deduction) in commit.new_deductions.iter().enumerate() {
            state.check_mandatory_unique(deduction)?;
            let repeated = commit.new_deductions[..position].iter().any(|earlier| {
                earlier.user_id == deduction.user_id
                    && earlier.deduction_type_id == deduction.deduction_type_id
            });
            if repeated {
                return Err(StoreError::conflict(
                    "deduction",
                    format!("{}/{}", deduction.user_id, deduction.deduction_type_id),
                ));
            }
        }

        for index in archive_indices {
            let entry = &mut state.payroll_entries[index];
            entry.status = PayrollStatus::Archived;
            entry.archived_at = commit.archived_at;
        }
        state.deductions.extend(commit.new_deductions);
        state.payroll_entries.extend(commit.entries);
        Ok(())
    }

    fn commit_release(&self, commit: ReleaseCommit) -> StoreResult<()> {
        let mut state = self.write()?;

        let mut release_indices = Vec::with_capacity(commit.releases.len());
        for release in &commit.releases {
            let index = state.entry_index(release.entry_id)?;
            if state.payroll_entries[index].status != PayrollStatus::Pending {
                return Err(StoreError::conflict("payroll entry", release.entry_id));
            }
            release_indices.push(index);
        }
        let mut loan_indices = Vec::with_capacity(commit.loan_updates.len());
        for loan in &commit.loan_updates {
            let index = state
                .loans
                .iter()
                .position(|l| l.id == loan.id)
                .ok_or_else(|| StoreError::not_found("loan", loan.id))?;
            loan_indices.push(index);
        }
        let mut deduction_indices = Vec::with_capacity(commit.archive_deduction_ids.len());
        for id in &commit.archive_deduction_ids {
            let index = state
                .deductions
                .iter()
                .position(|d| d.id == *id)
                .ok_or_else(|| StoreError::not_found("deduction", id))?;
            deduction_indices.push(index);
        }

        for (index, release) in release_indices.into_iter().zip(commit.releases) {
            let entry = &mut state.payroll_entries[index];
            entry.status = PayrollStatus::Released;
            entry.released_at = Some(commit.released_at);
            entry.basic_salary = release.basic_salary;
            entry.deductions = release.deductions;
            entry.net_pay = release.net_pay;
            entry.breakdown_snapshot = Some(release.snapshot);
        }
        for (index, loan) in loan_indices.into_iter().zip(commit.loan_updates) {
            state.loans[index] = loan;
        }
        for index in deduction_indices {
            state.deductions[index].archived_at = Some(commit.released_at);
        }
        state.settings = commit.settings;
        Ok(())
    }
}
