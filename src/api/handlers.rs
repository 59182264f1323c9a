//! HTTP request handlers for the payroll engine API.
//!
//! Every handler tags its log lines with a fresh `correlation_id` and
//! returns either the service result as JSON or an [`ApiError`] body.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{AttendanceSettings, Deduction, PayrollBreakdown};
use crate::services::{
    ApplyDeduction, DayStatus, GenerationReport, PayrollEntryView, PunchOutcome, ReleaseReport,
    SweepReport,
};

use super::request::{
    BulkDeleteRequest, BulkDeleteResponse, HistoryQuery, PunchRequest, ReleaseRequest,
};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

type ApiResult<T> = Result<Json<T>, ApiErrorResponse>;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/attendance/punch", post(punch_handler))
        .route("/attendance/sweep", post(sweep_handler))
        .route("/attendance/bulk-delete", post(bulk_delete_handler))
        .route("/attendance/:user_id/history", get(history_handler))
        .route("/attendance/:user_id/:date", get(day_status_handler))
        .route("/settings", get(get_settings_handler).put(put_settings_handler))
        .route("/deductions", post(apply_deduction_handler))
        .route("/payroll/preview/:user_id", get(preview_handler))
        .route("/payroll/generate", post(generate_handler))
        .route("/payroll/release", post(release_handler))
        .route("/payroll/entries/:id", get(entry_handler))
        .with_state(state)
}

/// Unwraps a JSON body or builds the rejection response.
///
/// Syntax errors are 400; well-formed JSON with bad field values is 422.
fn json_body<T>(
    correlation_id: Uuid,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiErrorResponse> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            let response = match rejection {
                JsonRejection::JsonDataError(err) => {
                    let body_text = err.body_text();
                    warn!(correlation_id = %correlation_id, error = %body_text, "JSON data error");
                    ApiErrorResponse {
                        status: StatusCode::UNPROCESSABLE_ENTITY,
                        error: ApiError::validation_error(body_text),
                    }
                }
                JsonRejection::JsonSyntaxError(err) => {
                    warn!(correlation_id = %correlation_id, error = %err, "JSON syntax error");
                    ApiErrorResponse::bad_request(ApiError::malformed_json(format!(
                        "Invalid JSON syntax: {}",
                        err
                    )))
                }
                JsonRejection::MissingJsonContentType(_) => {
                    ApiErrorResponse::bad_request(ApiError::new(
                        "MISSING_CONTENT_TYPE",
                        "Content-Type must be application/json",
                    ))
                }
                _ => ApiErrorResponse::bad_request(ApiError::malformed_json(
                    "Failed to parse request body",
                )),
            };
            Err(response)
        }
    }
}

fn path_params<T>(
    correlation_id: Uuid,
    path: Result<Path<T>, PathRejection>,
) -> Result<T, ApiErrorResponse> {
    path.map(|Path(params)| params).map_err(|rejection| {
        let body_text = rejection.body_text();
        warn!(correlation_id = %correlation_id, error = %body_text, "Invalid path parameter");
        ApiErrorResponse::bad_request(ApiError::validation_error(body_text))
    })
}

fn query_params<T>(
    correlation_id: Uuid,
    query: Result<Query<T>, QueryRejection>,
) -> Result<T, ApiErrorResponse> {
    query.map(|Query(params)| params).map_err(|rejection| {
        let body_text = rejection.body_text();
        warn!(correlation_id = %correlation_id, error = %body_text, "Invalid query string");
        ApiErrorResponse::bad_request(ApiError::validation_error(body_text))
    })
}

/// Logs a service failure and converts it for the client.
///
/// Store and internal failures are logged in full; the client sees a
/// generic body.
fn failed(correlation_id: Uuid, err: EngineError) -> ApiErrorResponse {
    match &err {
        EngineError::Store(_) | EngineError::Internal { .. } => {
            error!(correlation_id = %correlation_id, error = %err, "Request failed");
        }
        _ => {
            warn!(correlation_id = %correlation_id, error = %err, "Request rejected");
        }
    }
    err.into()
}

/// Handler for POST /attendance/punch.
async fn punch_handler(
    State(state): State<AppState>,
    payload: Result<Json<PunchRequest>, JsonRejection>,
) -> ApiResult<PunchOutcome> {
    let correlation_id = Uuid::new_v4();
    let request = json_body(correlation_id, payload)?;
    info!(correlation_id = %correlation_id, user_id = %request.user_id, "Processing punch");

    let outcome = state
        .attendance()
        .punch(&request.user_id)
        .map_err(|e| failed(correlation_id, e))?;
    Ok(Json(outcome))
}

/// Handler for GET /attendance/{user_id}/{date}.
async fn day_status_handler(
    State(state): State<AppState>,
    path: Result<Path<(String, NaiveDate)>, PathRejection>,
) -> ApiResult<DayStatus> {
    let correlation_id = Uuid::new_v4();
    let (user_id, date) = path_params(correlation_id, path)?;

    let status = state
        .attendance()
        .status_for(&user_id, date)
        .map_err(|e| failed(correlation_id, e))?;
    Ok(Json(status))
}

/// Handler for GET /attendance/{user_id}/history?start=..&end=..
async fn history_handler(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult<Vec<DayStatus>> {
    let correlation_id = Uuid::new_v4();
    let user_id = path_params(correlation_id, path)?;
    let query = query_params(correlation_id, query)?;

    let days = query
        .range()
        .and_then(|range| state.attendance().history(&user_id, range))
        .map_err(|e| failed(correlation_id, e))?;
    Ok(Json(days))
}

/// Handler for POST /attendance/sweep.
async fn sweep_handler(State(state): State<AppState>) -> ApiResult<SweepReport> {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Running absence sweep on request");

    let report = state
        .attendance()
        .mark_absentees()
        .map_err(|e| failed(correlation_id, e))?;
    Ok(Json(report))
}

/// Handler for POST /attendance/bulk-delete.
async fn bulk_delete_handler(
    State(state): State<AppState>,
    payload: Result<Json<BulkDeleteRequest>, JsonRejection>,
) -> ApiResult<BulkDeleteResponse> {
    let correlation_id = Uuid::new_v4();
    let request = json_body(correlation_id, payload)?;

    let deleted = request
        .range()
        .and_then(|range| {
            state
                .attendance()
                .bulk_delete(request.user_id.as_deref(), range)
        })
        .map_err(|e| failed(correlation_id, e))?;

    info!(correlation_id = %correlation_id, deleted, "Bulk deleted attendance");
    Ok(Json(BulkDeleteResponse { deleted }))
}

/// Handler for GET /settings.
async fn get_settings_handler(State(state): State<AppState>) -> ApiResult<AttendanceSettings> {
    let correlation_id = Uuid::new_v4();
    let settings = state
        .attendance()
        .settings()
        .map_err(|e| failed(correlation_id, e))?;
    Ok(Json(settings))
}

/// Handler for PUT /settings.
async fn put_settings_handler(
    State(state): State<AppState>,
    payload: Result<Json<AttendanceSettings>, JsonRejection>,
) -> ApiResult<AttendanceSettings> {
    let correlation_id = Uuid::new_v4();
    let settings = json_body(correlation_id, payload)?;

    let saved = state
        .attendance()
        .update_settings(settings)
        .map_err(|e| failed(correlation_id, e))?;
    info!(correlation_id = %correlation_id, "Attendance settings updated");
    Ok(Json(saved))
}

/// Handler for POST /deductions.
async fn apply_deduction_handler(
    State(state): State<AppState>,
    payload: Result<Json<ApplyDeduction>, JsonRejection>,
) -> Result<(StatusCode, Json<Deduction>), ApiErrorResponse> {
    let correlation_id = Uuid::new_v4();
    let request = json_body(correlation_id, payload)?;
    let user_id = request.user_id.clone();

    let deduction = state
        .payroll()
        .apply_deduction(request)
        .map_err(|e| failed(correlation_id, e))?;

    info!(
        correlation_id = %correlation_id,
        user_id = %user_id,
        amount = %deduction.amount,
        "Deduction applied"
    );
    Ok((StatusCode::CREATED, Json(deduction)))
}

/// Handler for GET /payroll/preview/{user_id}.
async fn preview_handler(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<PayrollBreakdown> {
    let correlation_id = Uuid::new_v4();
    let user_id = path_params(correlation_id, path)?;

    let breakdown = state
        .payroll()
        .preview(&user_id)
        .map_err(|e| failed(correlation_id, e))?;
    Ok(Json(breakdown))
}

/// Handler for POST /payroll/generate.
async fn generate_handler(State(state): State<AppState>) -> ApiResult<GenerationReport> {
    let correlation_id = Uuid::new_v4();
    let start_time = Instant::now();

    let report = state
        .payroll()
        .generate()
        .map_err(|e| failed(correlation_id, e))?;

    info!(
        correlation_id = %correlation_id,
        period_start = %report.period.start,
        entries = report.entries.len(),
        duration_us = start_time.elapsed().as_micros(),
        "Payroll generated"
    );
    Ok(Json(report))
}

/// Handler for POST /payroll/release.
async fn release_handler(
    State(state): State<AppState>,
    payload: Result<Json<ReleaseRequest>, JsonRejection>,
) -> ApiResult<ReleaseReport> {
    let correlation_id = Uuid::new_v4();
    let request = json_body(correlation_id, payload)?;
    let start_time = Instant::now();

    let report = request
        .next_period()
        .and_then(|next| state.payroll().release(next))
        .map_err(|e| failed(correlation_id, e))?;

    info!(
        correlation_id = %correlation_id,
        period_start = %report.period.start,
        entries = report.released_entries.len(),
        duration_us = start_time.elapsed().as_micros(),
        "Payroll released"
    );
    Ok(Json(report))
}

/// Handler for GET /payroll/entries/{id}.
async fn entry_handler(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<PayrollEntryView> {
    let correlation_id = Uuid::new_v4();
    let id = path_params(correlation_id, path)?;

    let view = state
        .payroll()
        .entry_view(id)
        .map_err(|e| failed(correlation_id, e))?;
    Ok(Json(view))
}
