//! Persistence boundary for the engine.
//!
//! The engine reads and writes through the [`Repository`] trait and never
//! caches store state between calls. Every call is atomic. Uniqueness of
//! attendance per `(user, date)` and of live mandatory deductions per
//! `(user, type)` is enforced here, and surfaces as [`StoreError::Conflict`].
//! Generation and release are each written as one commit that applies
//! completely or not at all.

mod memory;

pub use memory::InMemoryRepository;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Addition, AttendanceRecord, AttendanceSettings, BreakdownSnapshot, DateRange, Deduction,
    DeductionType, Loan, PayrollEntry, PayrollStatus, Personnel, Punches,
};

/// Errors raised at the store boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A uniqueness constraint or a state precondition was violated.
    #[error("Conflict on {entity}: {key}")]
    Conflict {
        /// The kind of entity.
        entity: String,
        /// The conflicting key.
        key: String,
    },

    /// A referenced row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity.
        entity: String,
        /// The missing identifier.
        id: String,
    },

    /// The store could not serve the request.
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// Internal detail, never shown to end users.
        message: String,
    },
}

impl StoreError {
    /// Shorthand for a [`StoreError::Conflict`].
    pub fn conflict(entity: &str, key: impl ToString) -> Self {
        Self::Conflict {
            entity: entity.to_string(),
            key: key.to_string(),
        }
    }

    /// Shorthand for a [`StoreError::NotFound`].
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

/// Result type for repository operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Everything written by one payroll generation.
#[derive(Debug, Clone, Default)]
pub struct GenerationCommit {
    /// New pending entries.
    pub entries: Vec<PayrollEntry>,
    /// Live entries superseded by the new ones.
    pub archive_entry_ids: Vec<Uuid>,
    /// Mandatory deduction instances materialized for the first time.
    pub new_deductions: Vec<Deduction>,
    /// Civil time stamped on archived entries.
    pub archived_at: Option<NaiveDateTime>,
}

/// The frozen figures written onto one released entry.
#[derive(Debug, Clone)]
pub struct EntryRelease {
    /// The pending entry being released.
    pub entry_id: Uuid,
    /// Gross at release.
    pub basic_salary: Decimal,
    /// Deductions at release.
    pub deductions: Decimal,
    /// Net pay at release.
    pub net_pay: Decimal,
    /// The frozen breakdown.
    pub snapshot: BreakdownSnapshot,
}

/// Everything written by one payroll release.
#[derive(Debug, Clone)]
pub struct ReleaseCommit {
    /// Entries moving from pending to released.
    pub releases: Vec<EntryRelease>,
    /// Loans after their installment was applied.
    pub loan_updates: Vec<Loan>,
    /// One-off deductions consumed by the release.
    pub archive_deduction_ids: Vec<Uuid>,
    /// Civil time of the release.
    pub released_at: NaiveDateTime,
    /// Settings advanced to the next period.
    pub settings: AttendanceSettings,
}

/// The narrow store interface the engine depends on.
///
/// Implementations must make each call atomic and must not partially apply
/// a commit.
pub trait Repository: Send + Sync {
    /// Reads the attendance settings.
    fn get_settings(&self) -> StoreResult<AttendanceSettings>;

    /// Replaces the attendance settings.
    fn save_settings(&self, settings: &AttendanceSettings) -> StoreResult<()>;

    /// Finds one user's record for a date.
    fn find_attendance(&self, user_id: &str, date: NaiveDate)
    -> StoreResult<Option<AttendanceRecord>>;

    /// Inserts a record; a second record for the same `(user, date)` is a conflict.
    fn insert_attendance(&self, record: AttendanceRecord) -> StoreResult<()>;

    /// Replaces an existing record, matched by `(user, date)`, provided its
    /// stored punches still equal `expected`. A record whose punches changed
    /// since it was read is a conflict.
    fn update_attendance(&self, record: &AttendanceRecord, expected: Punches) -> StoreResult<()>;

    /// Lists records in a date range, for one user or everyone, ordered by user then date.
    fn list_attendance(
        &self,
        user_id: Option<&str>,
        range: DateRange,
    ) -> StoreResult<Vec<AttendanceRecord>>;

    /// Deletes records in a date range, for one user or everyone.
    fn delete_attendance(&self, user_id: Option<&str>, range: DateRange) -> StoreResult<usize>;

    /// Lists deduction types, optionally only mandatory or only non-mandatory ones.
    fn list_deduction_types(&self, mandatory: Option<bool>) -> StoreResult<Vec<DeductionType>>;

    /// Lists a user's deduction instances.
    ///
    /// `period` filters on the applied date; archived instances are skipped
    /// unless `include_archived` is set.
    fn list_deductions(
        &self,
        user_id: &str,
        period: Option<DateRange>,
        include_archived: bool,
    ) -> StoreResult<Vec<Deduction>>;

    /// Creates a deduction instance.
    ///
    /// A second live instance of a mandatory type for the same user is a conflict.
    fn create_deduction(&self, deduction: Deduction) -> StoreResult<()>;

    /// Lists a user's additions applied within a period.
    fn list_additions(&self, user_id: &str, period: DateRange) -> StoreResult<Vec<Addition>>;

    /// Lists active loans, for one user or everyone.
    fn list_active_loans(&self, user_id: Option<&str>) -> StoreResult<Vec<Loan>>;

    /// Lists payroll entries, optionally filtered by period and status, oldest first.
    fn list_payroll_entries(
        &self,
        period: Option<DateRange>,
        status: Option<PayrollStatus>,
    ) -> StoreResult<Vec<PayrollEntry>>;

    /// Finds one payroll entry.
    fn find_payroll_entry(&self, id: Uuid) -> StoreResult<Option<PayrollEntry>>;

    /// Lists personnel on the payroll.
    fn list_active_personnel(&self) -> StoreResult<Vec<Personnel>>;

    /// Finds one user's personnel record.
    fn find_personnel(&self, user_id: &str) -> StoreResult<Option<Personnel>>;

    /// Applies a payroll generation atomically.
    fn commit_generation(&self, commit: GenerationCommit) -> StoreResult<()>;

    /// Applies a payroll release atomically.
    ///
    /// Fails with a conflict, writing nothing, if any entry is no longer pending.
    fn commit_release(&self, commit: ReleaseCommit) -> StoreResult<()>;
}
