//! The single source of "now" for every cutoff comparison.
//!
//! All time reasoning in the engine uses civil date-times in one fixed UTC
//! offset. Business logic never reads the system clock directly; it receives
//! a [`Clock`] and asks it.

use std::sync::RwLock;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Utc};

/// Source of the current instant in the engine's civil timezone.
pub trait Clock: Send + Sync {
    /// The current instant, expressed in the civil offset.
    fn now(&self) -> DateTime<FixedOffset>;

    /// The current civil date-time.
    fn civil_now(&self) -> NaiveDateTime {
        self.now().naive_local()
    }

    /// The current civil date.
    fn today(&self) -> NaiveDate {
        self.civil_now().date()
    }
}

/// Real clock pinned to a fixed UTC offset.
///
/// The host's local timezone is never consulted.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Creates a system clock reporting time in `offset`.
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }
}

/// Settable clock for deterministic tests and simulations.
///
/// # Example
///
/// ```
/// use payroll_engine::clock::{Clock, FixedClock};
/// use chrono::{FixedOffset, NaiveDateTime};
///
/// let offset = FixedOffset::east_opt(8 * 3600).unwrap();
/// let at = NaiveDateTime::parse_from_str("2026-01-05 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
/// let clock = FixedClock::at(at, offset);
/// assert_eq!(clock.civil_now(), at);
///
/// clock.advance(chrono::Duration::hours(8));
/// assert_eq!(clock.civil_now().to_string(), "2026-01-05 18:00:00");
/// ```
#[derive(Debug)]
pub struct FixedClock {
    instant: RwLock<DateTime<FixedOffset>>,
}

impl FixedClock {
    /// Creates a clock frozen at `instant`.
    pub fn new(instant: DateTime<FixedOffset>) -> Self {
        Self {
            instant: RwLock::new(instant),
        }
    }

    /// Creates a clock frozen at a civil date-time in `offset`.
    pub fn at(civil: NaiveDateTime, offset: FixedOffset) -> Self {
        Self::new(civil_instant(civil, offset))
    }

    /// Moves the clock to a civil date-time, keeping its offset.
    pub fn set(&self, civil: NaiveDateTime) {
        let mut guard = self.instant.write().unwrap_or_else(|e| e.into_inner());
        let offset = *guard.offset();
        *guard = civil_instant(civil, offset);
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut guard = self.instant.write().unwrap_or_else(|e| e.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.instant.read().unwrap_or_else(|e| e.into_inner())
    }
}

fn civil_instant(civil: NaiveDateTime, offset: FixedOffset) -> DateTime<FixedOffset> {
    let utc = civil - Duration::seconds(i64::from(offset.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(utc, offset)
}
