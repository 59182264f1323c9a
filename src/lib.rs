//! Attendance Status and Payroll Deduction Engine
//!
//! This crate derives a daily attendance status for each employee from their
//! time-in/time-out punches and the configured attendance windows, and turns
//! a period's attendance, standing deductions, loans and additions into a
//! semi-monthly payroll breakdown with an auditable trace.
//!
//! The layers, bottom up:
//!
//! - [`models`]: records and value types.
//! - [`calculation`]: pure functions for status, rates and aggregation.
//! - [`store`]: the [`Repository`](store::Repository) seam and an in-memory
//!   implementation.
//! - [`services`]: punch, sweep, preview, generate and release.
//! - [`jobs`]: the periodic absence sweep.
//! - [`api`]: the axum router.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod clock;
pub mod config;
pub mod error;
pub mod jobs;
pub mod models;
pub mod services;
pub mod store;
