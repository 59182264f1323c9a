//! Application state for the payroll engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::calculation::AttendanceRules;
use crate::clock::Clock;
use crate::services::{AttendanceService, PayrollService};
use crate::store::Repository;

/// Shared application state.
///
/// Both services share one repository and one clock, so a punch recorded
/// through one is visible to the other immediately.
#[derive(Clone)]
pub struct AppState {
    attendance: Arc<AttendanceService>,
    payroll: Arc<PayrollService>,
}

impl AppState {
    /// Builds both services over the given collaborators.
    pub fn new(repo: Arc<dyn Repository>, clock: Arc<dyn Clock>, rules: AttendanceRules) -> Self {
        Self {
            attendance: Arc::new(AttendanceService::new(repo.clone(), clock.clone(), rules)),
            payroll: Arc::new(PayrollService::new(repo, clock, rules)),
        }
    }

    /// The attendance service.
    pub fn attendance(&self) -> &AttendanceService {
        &self.attendance
    }

    /// A shared handle to the attendance service, for background jobs.
    pub fn attendance_handle(&self) -> Arc<AttendanceService> {
        self.attendance.clone()
    }

    /// The payroll service.
    pub fn payroll(&self) -> &PayrollService {
        &self.payroll
    }
}
