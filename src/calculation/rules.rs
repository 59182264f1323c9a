//! Deployment-level attendance rules.

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Default minutes of grace after the time-in cutoff.
pub const DEFAULT_LATE_GRACE_MINUTES: u32 = 1;

/// Rules that are fixed per deployment rather than edited by admins.
///
/// Built from the YAML engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRules {
    /// The weekly rest day, excluded from every working-day calendar.
    pub rest_day: Weekday,
    /// Grace after the time-in cutoff before a punch counts as late.
    pub late_grace_minutes: u32,
}

impl Default for AttendanceRules {
    fn default() -> Self {
        Self {
            rest_day: Weekday::Sun,
            late_grace_minutes: DEFAULT_LATE_GRACE_MINUTES,
        }
    }
}
