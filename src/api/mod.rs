//! HTTP API for the payroll engine.
//!
//! Thin axum handlers over [`AttendanceService`](crate::services::AttendanceService)
//! and [`PayrollService`](crate::services::PayrollService).

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    BulkDeleteRequest, BulkDeleteResponse, HistoryQuery, PunchRequest, ReleaseRequest,
};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
