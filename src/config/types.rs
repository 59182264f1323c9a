//! Configuration types for the engine.
//!
//! These structures are deserialized from the engine's YAML file. Every
//! field has a default so an empty file is a valid configuration.

use std::time::Duration;

use chrono::{FixedOffset, Weekday};
use serde::Deserialize;

use crate::calculation::{AttendanceRules, DEFAULT_LATE_GRACE_MINUTES};

/// Minutes east of UTC for Asia/Manila.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 8 * 60;

/// Seconds between absence sweeps.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Engine-wide settings that are not admin-editable at runtime.
///
/// Attendance windows and the payroll period live in the store as
/// [`AttendanceSettings`](crate::models::AttendanceSettings); this holds the
/// deployment-level constants around them.
///
/// # Example
///
/// ```
/// use payroll_engine::config::EngineConfig;
/// use chrono::Weekday;
///
/// let config: EngineConfig = serde_yaml::from_str("rest_day: Sat").unwrap();
/// assert_eq!(config.rest_day, Weekday::Sat);
/// assert_eq!(config.utc_offset_minutes, 480);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Civil timezone as minutes east of UTC.
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
    /// The weekly non-working day.
    #[serde(default = "default_rest_day")]
    pub rest_day: Weekday,
    /// Minutes after the time-in cutoff still counted as on time.
    #[serde(default = "default_late_grace_minutes")]
    pub late_grace_minutes: u32,
    /// Interval of the background absence sweep.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_utc_offset_minutes() -> i32 {
    DEFAULT_UTC_OFFSET_MINUTES
}

fn default_rest_day() -> Weekday {
    Weekday::Sun
}

fn default_late_grace_minutes() -> u32 {
    DEFAULT_LATE_GRACE_MINUTES
}

fn default_sweep_interval_secs() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            rest_day: Weekday::Sun,
            late_grace_minutes: DEFAULT_LATE_GRACE_MINUTES,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl EngineConfig {
    /// The attendance rules derived from this configuration.
    pub fn rules(&self) -> AttendanceRules {
        AttendanceRules {
            rest_day: self.rest_day,
            late_grace_minutes: self.late_grace_minutes,
        }
    }

    /// The civil timezone offset, or `None` if out of range.
    pub fn offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes.checked_mul(60)?)
    }

    /// The absence sweep interval.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Checks ranges serde cannot express.
    pub(crate) fn check(&self) -> Result<(), String> {
        if self.offset().is_none() {
            return Err(format!(
                "utc_offset_minutes {} is outside -1439..=1439",
                self.utc_offset_minutes
            ));
        }
        if self.late_grace_minutes >= 24 * 60 {
            return Err(format!(
                "late_grace_minutes {} must be less than a day",
                self.late_grace_minutes
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err("sweep_interval_secs must be positive".to_string());
        }
        Ok(())
    }
}
