//! Configuration loading for the payroll engine.
//!
//! Deployment constants (timezone, rest day, late grace, sweep interval)
//! are read from a YAML file. Attendance windows and the payroll period are
//! not here; they are admin-editable data held by the store.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/engine.yaml").unwrap().into_config();
//! println!("Sweeping every {}s", config.sweep_interval_secs);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{DEFAULT_SWEEP_INTERVAL_SECS, DEFAULT_UTC_OFFSET_MINUTES, EngineConfig};
