//! Punches, day statuses, the absence sweep and settings maintenance.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::conflict_as;
use crate::calculation::{
    AttendanceRules, WindowPosition, is_working_day, resolve_status, time_in_window_closed,
    window_position,
};
use crate::clock::Clock;
use crate::error::{EngineError, EngineResult};
use crate::models::{AttendanceRecord, AttendanceSettings, AttendanceStatus, DateRange, TimeOfDay};
use crate::store::{Repository, StoreError};

/// Which punch of the day was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunchKind {
    /// First punch.
    TimeIn,
    /// Second punch.
    TimeOut,
}

/// The result of an accepted punch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PunchOutcome {
    /// Which punch was recorded.
    pub kind: PunchKind,
    /// The record after the punch.
    pub record: AttendanceRecord,
}

/// A day's status as of the current time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStatus {
    /// The user.
    pub user_id: String,
    /// The civil date.
    pub date: NaiveDate,
    /// Status derived right now.
    pub status: AttendanceStatus,
    /// Time-in punch, if any.
    pub time_in: Option<NaiveDateTime>,
    /// Time-out punch, if any.
    pub time_out: Option<NaiveDateTime>,
}

/// What one run of the absence sweep did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// The civil date swept.
    pub date: NaiveDate,
    /// ABSENT records created.
    pub marked_absent: usize,
    /// Existing records whose stored status changed.
    pub refreshed: usize,
    /// Why absences were not materialized, if they were not.
    pub skipped: Option<String>,
}

/// Attendance operations over a store and a clock.
pub struct AttendanceService {
    repo: Arc<dyn Repository>,
    clock: Arc<dyn Clock>,
    rules: AttendanceRules,
}

impl AttendanceService {
    /// Creates the service.
    pub fn new(repo: Arc<dyn Repository>, clock: Arc<dyn Clock>, rules: AttendanceRules) -> Self {
        Self { repo, clock, rules }
    }

    /// The deployment rules in effect.
    pub fn rules(&self) -> &AttendanceRules {
        &self.rules
    }

    /// Records a punch for `user_id` at the current time.
    ///
    /// The first punch of a working day is the time-in, the second the
    /// time-out. A third punch, a punch on the rest day, a time-in before the
    /// time-in window opens and a time-out after the time-out window closed
    /// are all rejected as conflicts.
    pub fn punch(&self, user_id: &str) -> EngineResult<PunchOutcome> {
        let now = self.clock.civil_now();
        let today = now.date();
        let settings = self.repo.get_settings()?;

        if self.repo.find_personnel(user_id)?.is_none() {
            return Err(EngineError::not_found("Personnel", user_id));
        }

        let result = self.record_punch(user_id, now, &settings);
        match &result {
            Ok(outcome) => tracing::info!(
                user_id = %user_id,
                date = %today,
                kind = ?outcome.kind,
                status = %outcome.record.status,
                "Punch accepted"
            ),
            Err(error) => tracing::warn!(
                user_id = %user_id,
                date = %today,
                error = %error,
                "Punch rejected"
            ),
        }
        result
    }

    fn record_punch(
        &self,
        user_id: &str,
        now: NaiveDateTime,
        settings: &AttendanceSettings,
    ) -> EngineResult<PunchOutcome> {
        let today = now.date();
        let time_of_day = TimeOfDay::from_time(now.time());

        if !is_working_day(today, self.rules.rest_day) {
            return Err(EngineError::conflict(format!(
                "{} is a rest day; punches are not accepted",
                today
            )));
        }

        let existing = self.repo.find_attendance(user_id, today)?;
        match existing {
            Some(record) if record.time_out.is_some() => {
                Err(EngineError::conflict("already timed out today"))
            }
            Some(mut record) if record.time_in.is_some() => {
                if window_position(time_of_day, None, settings.time_out_end) == WindowPosition::After {
                    return Err(EngineError::conflict(format!(
                        "time-out window closed at {}",
                        display_bound(settings.time_out_end)
                    )));
                }
                let expected = record.punches();
                record.time_out = Some(now);
                record.status = self.derive(&record, now, settings);
                self.repo
                    .update_attendance(&record, expected)
                    .map_err(|e| conflict_as(e, || "already timed out today".to_string()))?;
                Ok(PunchOutcome {
                    kind: PunchKind::TimeOut,
                    record,
                })
            }
            existing => {
                if window_position(time_of_day, settings.time_in_start, None) == WindowPosition::Before
                {
                    return Err(EngineError::conflict(format!(
                        "time-in window opens at {}",
                        display_bound(settings.time_in_start)
                    )));
                }

                let record = match existing {
                    // A swept ABSENT record is completed by a late arrival.
                    Some(mut record) => {
                        let expected = record.punches();
                        record.time_in = Some(now);
                        record.status = self.derive(&record, now, settings);
                        self.repo.update_attendance(&record, expected).map_err(|e| {
                            conflict_as(e, || {
                                format!(
                                    "attendance for {} on {} was recorded concurrently; punch again",
                                    user_id, today
                                )
                            })
                        })?;
                        record
                    }
                    None => {
                        let mut record = AttendanceRecord::timed_in(user_id, now);
                        record.status = self.derive(&record, now, settings);
                        self.repo.insert_attendance(record.clone()).map_err(|e| {
                            conflict_as(e, || {
                                format!(
                                    "attendance for {} on {} was recorded concurrently; punch again",
                                    user_id, today
                                )
                            })
                        })?;
                        record
                    }
                };
                Ok(PunchOutcome {
                    kind: PunchKind::TimeIn,
                    record,
                })
            }
        }
    }

    fn derive(
        &self,
        record: &AttendanceRecord,
        now: NaiveDateTime,
        settings: &AttendanceSettings,
    ) -> AttendanceStatus {
        resolve_status(record.date, record.punches(), now, settings, &self.rules)
    }

    /// The status of one user's day as of now.
    pub fn status_for(&self, user_id: &str, date: NaiveDate) -> EngineResult<DayStatus> {
        let settings = self.repo.get_settings()?;
        let now = self.clock.civil_now();
        let record = self.repo.find_attendance(user_id, date)?;
        Ok(self.day_status(user_id, date, record.as_ref(), now, &settings))
    }

    /// Statuses for every date in a range, rest days included.
    pub fn history(&self, user_id: &str, range: DateRange) -> EngineResult<Vec<DayStatus>> {
        let settings = self.repo.get_settings()?;
        let now = self.clock.civil_now();
        let records = self.repo.list_attendance(Some(user_id), range)?;

        Ok(range
            .start
            .iter_days()
            .take_while(|date| *date <= range.end)
            .map(|date| {
                let record = records.iter().find(|r| r.date == date);
                self.day_status(user_id, date, record, now, &settings)
            })
            .collect())
    }

    fn day_status(
        &self,
        user_id: &str,
        date: NaiveDate,
        record: Option<&AttendanceRecord>,
        now: NaiveDateTime,
        settings: &AttendanceSettings,
    ) -> DayStatus {
        let punches = record.map(AttendanceRecord::punches).unwrap_or_default();
        DayStatus {
            user_id: user_id.to_string(),
            date,
            status: resolve_status(date, punches, now, settings, &self.rules),
            time_in: punches.time_in,
            time_out: punches.time_out,
        }
    }

    /// Materializes today's absences once the time-in window has closed.
    ///
    /// Also refreshes the stored status of today's records. Running it
    /// twice creates nothing new.
    pub fn mark_absentees(&self) -> EngineResult<SweepReport> {
        let settings = self.repo.get_settings()?;
        let now = self.clock.civil_now();
        let today = now.date();

        let skipped = if !settings.auto_mark_absent {
            Some("automatic absence marking is disabled".to_string())
        } else if !is_working_day(today, self.rules.rest_day) {
            Some(format!("{} is a rest day", today))
        } else if !time_in_window_closed(now, &settings) {
            Some("time-in window is still open".to_string())
        } else {
            None
        };

        let mut marked_absent = 0;
        if skipped.is_none() {
            for personnel in self.repo.list_active_personnel()? {
                if self.repo.find_attendance(&personnel.user_id, today)?.is_some() {
                    continue;
                }
                let record =
                    AttendanceRecord::new(&personnel.user_id, today, AttendanceStatus::Absent);
                match self.repo.insert_attendance(record) {
                    Ok(()) => marked_absent += 1,
                    // Punched between the check and the insert.
                    Err(StoreError::Conflict { .. }) => {}
                    Err(other) => return Err(other.into()),
                }
            }
        }

        let mut refreshed = 0;
        for mut record in self.repo.list_attendance(None, DateRange::single(today))? {
            let status = self.derive(&record, now, &settings);
            if status != record.status {
                record.status = status;
                match self.repo.update_attendance(&record, record.punches()) {
                    Ok(()) => refreshed += 1,
                    // A punch landed since the listing; it stored its own status.
                    Err(StoreError::Conflict { .. }) => {}
                    Err(other) => return Err(other.into()),
                }
            }
        }

        tracing::info!(
            date = %today,
            marked_absent,
            refreshed,
            skipped = skipped.as_deref().unwrap_or("none"),
            "Absence sweep finished"
        );

        Ok(SweepReport {
            date: today,
            marked_absent,
            refreshed,
            skipped,
        })
    }

    /// Reads the attendance settings.
    pub fn settings(&self) -> EngineResult<AttendanceSettings> {
        Ok(self.repo.get_settings()?)
    }

    /// Validates and stores new settings.
    pub fn update_settings(&self, settings: AttendanceSettings) -> EngineResult<AttendanceSettings> {
        settings.validate()?;
        self.repo.save_settings(&settings)?;
        tracing::info!(
            period_start = ?settings.period_start,
            period_end = ?settings.period_end,
            "Attendance settings updated"
        );
        Ok(settings)
    }

    /// Deletes attendance in a date range, for one user or everyone.
    pub fn bulk_delete(&self, user_id: Option<&str>, range: DateRange) -> EngineResult<usize> {
        let deleted = self.repo.delete_attendance(user_id, range)?;
        tracing::info!(
            user_id = user_id.unwrap_or("all"),
            range = %range,
            deleted,
            "Attendance deleted"
        );
        Ok(deleted)
    }
}

fn display_bound(bound: Option<TimeOfDay>) -> String {
    bound.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::{Personnel, PersonnelType};
    use crate::store::InMemoryRepository;
    use chrono::FixedOffset;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn make_datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn make_date(date_str: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
    }

    fn personnel(user_id: &str) -> Personnel {
        Personnel {
            user_id: user_id.to_string(),
            name: user_id.to_string(),
            is_active: true,
            personnel_type: PersonnelType {
                id: Uuid::new_v4(),
                name: "Staff".to_string(),
                basic_salary: Decimal::new(26000, 0),
                is_active: true,
            },
        }
    }

    fn setup(now: &str) -> (Arc<InMemoryRepository>, Arc<FixedClock>, AttendanceService) {
        let repo = Arc::new(InMemoryRepository::with_settings(AttendanceSettings {
            time_in_start: Some("07:00".parse().unwrap()),
            time_in_end: Some("09:30".parse().unwrap()),
            time_out_start: Some("16:00".parse().unwrap()),
            time_out_end: Some("17:00".parse().unwrap()),
            ..AttendanceSettings::default()
        }));
        repo.insert_personnel(personnel("user_001")).unwrap();
        repo.insert_personnel(personnel("user_002")).unwrap();
        let clock = Arc::new(FixedClock::at(
            make_datetime(now),
            FixedOffset::east_opt(8 * 3600).unwrap(),
        ));
        let service = AttendanceService::new(repo.clone(), clock.clone(), AttendanceRules::default());
        (repo, clock, service)
    }

    #[test]
    fn test_punch_sequence() {
        let (_, clock, service) = setup("2026-01-05 08:00:00");

        let first = service.punch("user_001").unwrap();
        assert_eq!(first.kind, PunchKind::TimeIn);
        assert_eq!(first.record.status, AttendanceStatus::Present);

        clock.set(make_datetime("2026-01-05 16:30:00"));
        let second = service.punch("user_001").unwrap();
        assert_eq!(second.kind, PunchKind::TimeOut);
        assert_eq!(second.record.time_out, Some(make_datetime("2026-01-05 16:30:00")));

        let third = service.punch("user_001");
        match third {
            Err(EngineError::Conflict { message }) => assert_eq!(message, "already timed out today"),
            other => panic!("Expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_concurrent_time_outs_accept_one() {
        let (repo, clock, service) = setup("2026-01-05 08:00:00");
        service.punch("user_001").unwrap();
        clock.set(make_datetime("2026-01-05 16:30:00"));

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| service.punch("user_001")))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let accepted = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(accepted, 1);
        assert!(
            results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| matches!(e, EngineError::Conflict { .. }))
        );
        let stored = repo.find_attendance("user_001", make_date("2026-01-05")).unwrap().unwrap();
        assert_eq!(stored.time_out, Some(make_datetime("2026-01-05 16:30:00")));
    }

    #[test]
    fn test_late_punch_stores_late_hint() {
        let (repo, _, service) = setup("2026-01-05 09:31:00");
        service.punch("user_001").unwrap();
        let stored = repo.find_attendance("user_001", make_date("2026-01-05")).unwrap().unwrap();
        assert_eq!(stored.status, AttendanceStatus::Late);
    }

    #[test]
    fn test_punch_before_window_opens_is_rejected() {
        let (repo, _, service) = setup("2026-01-05 06:30:00");
        assert!(matches!(service.punch("user_001"), Err(EngineError::Conflict { .. })));
        assert!(repo.find_attendance("user_001", make_date("2026-01-05")).unwrap().is_none());
    }

    #[test]
    fn test_time_out_after_window_is_rejected() {
        let (_, clock, service) = setup("2026-01-05 08:00:00");
        service.punch("user_001").unwrap();
        clock.set(make_datetime("2026-01-05 17:01:00"));
        match service.punch("user_001") {
            Err(EngineError::Conflict { message }) => assert!(message.contains("17:00")),
            other => panic!("Expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_punch_on_rest_day_is_rejected() {
        let (_, _, service) = setup("2026-01-04 08:00:00");
        assert!(matches!(service.punch("user_001"), Err(EngineError::Conflict { .. })));
    }

    #[test]
    fn test_unknown_user_is_not_found() {
        let (_, _, service) = setup("2026-01-05 08:00:00");
        assert!(matches!(service.punch("ghost"), Err(EngineError::NotFound { .. })));
    }

    #[test]
    fn test_sweep_marks_absentees_once() {
        let (repo, clock, service) = setup("2026-01-05 08:00:00");
        service.punch("user_001").unwrap();

        let early = service.mark_absentees().unwrap();
        assert_eq!(early.marked_absent, 0);
        assert!(early.skipped.is_some());

        clock.set(make_datetime("2026-01-05 10:00:00"));
        let report = service.mark_absentees().unwrap();
        assert_eq!(report.marked_absent, 1);
        assert!(report.skipped.is_none());

        let again = service.mark_absentees().unwrap();
        assert_eq!(again.marked_absent, 0);

        let absent = repo.find_attendance("user_002", make_date("2026-01-05")).unwrap().unwrap();
        assert_eq!(absent.status, AttendanceStatus::Absent);
    }

    #[test]
    fn test_sweep_disabled_by_settings() {
        let (repo, _, service) = setup("2026-01-05 10:00:00");
        let mut settings = repo.get_settings().unwrap();
        settings.auto_mark_absent = false;
        service.update_settings(settings).unwrap();

        let report = service.mark_absentees().unwrap();
        assert_eq!(report.marked_absent, 0);
        assert!(repo.find_attendance("user_002", make_date("2026-01-05")).unwrap().is_none());
    }

    #[test]
    fn test_sweep_refreshes_partial_hint() {
        let (repo, clock, service) = setup("2026-01-05 08:00:00");
        service.punch("user_001").unwrap();
        clock.set(make_datetime("2026-01-05 18:00:00"));

        let report = service.mark_absentees().unwrap();
        assert_eq!(report.refreshed, 1);
        let stored = repo.find_attendance("user_001", make_date("2026-01-05")).unwrap().unwrap();
        assert_eq!(stored.status, AttendanceStatus::Partial);
    }

    #[test]
    fn test_late_arrival_completes_swept_absence() {
        let (_, clock, service) = setup("2026-01-05 10:00:00");
        service.mark_absentees().unwrap();

        clock.set(make_datetime("2026-01-05 10:15:00"));
        let outcome = service.punch("user_002").unwrap();
        assert_eq!(outcome.kind, PunchKind::TimeIn);
        assert_eq!(outcome.record.status, AttendanceStatus::Late);
    }

    #[test]
    fn test_history_includes_rest_days() {
        let (_, _, service) = setup("2026-01-06 08:00:00");
        let range = DateRange::new(make_date("2026-01-03"), make_date("2026-01-06")).unwrap();
        let history = service.history("user_001", range).unwrap();
        let statuses: Vec<AttendanceStatus> = history.iter().map(|d| d.status).collect();
        assert_eq!(
            statuses,
            vec![
                AttendanceStatus::Absent,
                AttendanceStatus::NonWorking,
                AttendanceStatus::Absent,
                AttendanceStatus::Pending,
            ]
        );
    }

    #[test]
    fn test_status_recomputed_on_read() {
        let (_, clock, service) = setup("2026-01-05 08:00:00");
        let date = make_date("2026-01-05");
        assert_eq!(service.status_for("user_001", date).unwrap().status, AttendanceStatus::Pending);
        clock.set(make_datetime("2026-01-05 09:45:00"));
        assert_eq!(service.status_for("user_001", date).unwrap().status, AttendanceStatus::Absent);
    }

    #[test]
    fn test_update_settings_rejects_invalid_window() {
        let (_, _, service) = setup("2026-01-05 08:00:00");
        let settings = AttendanceSettings {
            time_in_start: Some("10:00".parse().unwrap()),
            time_in_end: Some("09:00".parse().unwrap()),
            ..AttendanceSettings::default()
        };
        assert!(matches!(
            service.update_settings(settings),
            Err(EngineError::InvalidSettings { .. })
        ));
    }

    #[test]
    fn test_bulk_delete_for_one_user() {
        let (_, _, service) = setup("2026-01-05 10:00:00");
        service.mark_absentees().unwrap();
        let range = DateRange::single(make_date("2026-01-05"));
        assert_eq!(service.bulk_delete(Some("user_001"), range).unwrap(), 1);
        assert_eq!(service.bulk_delete(None, range).unwrap(), 1);
    }
}
