//! Time-of-day window checks.
//!
//! Every comparison here works on minute-of-day values, never on instants,
//! so the date and offset of a punch cannot leak into the result.

use crate::models::TimeOfDay;

/// Where a time of day falls relative to a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPosition {
    /// Before the window opens.
    Before,
    /// Inside the window, bounds included.
    Within,
    /// After the window closed.
    After,
}

/// True if either bound is absent, else `start <= time <= end`.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::within_window;
/// use payroll_engine::models::TimeOfDay;
///
/// let t: TimeOfDay = "09:30".parse().unwrap();
/// let start = Some("07:00".parse().unwrap());
/// let end = Some("09:30".parse().unwrap());
/// assert!(within_window(t, start, end));
/// assert!(within_window(t, None, Some("08:00".parse().unwrap())));
/// ```
pub fn within_window(time: TimeOfDay, start: Option<TimeOfDay>, end: Option<TimeOfDay>) -> bool {
    match (start, end) {
        (Some(start), Some(end)) => start <= time && time <= end,
        _ => true,
    }
}

/// Places a time of day relative to a window whose bounds may be open.
///
/// A missing bound never excludes anything on its side.
pub fn window_position(
    time: TimeOfDay,
    start: Option<TimeOfDay>,
    end: Option<TimeOfDay>,
) -> WindowPosition {
    if start.is_some_and(|start| time < start) {
        WindowPosition::Before
    } else if end.is_some_and(|end| time > end) {
        WindowPosition::After
    } else {
        WindowPosition::Within
    }
}

/// True once `time` reaches `window_end` plus the grace minutes.
///
/// Times are whole minutes, so with a 09:30 cutoff and one minute of grace
/// any punch during 09:30 is on time and 09:31 is late. The cutoff minute is
/// never late, so a grace of zero behaves like a grace of one.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::is_late;
///
/// let end = "09:30".parse().unwrap();
/// assert!(!is_late("09:30".parse().unwrap(), end, 1));
/// assert!(is_late("09:31".parse().unwrap(), end, 1));
/// ```
pub fn is_late(time: TimeOfDay, window_end: TimeOfDay, grace_minutes: u32) -> bool {
    time.minute_of_day() >= window_end.minute_of_day() + grace_minutes.max(1)
}
