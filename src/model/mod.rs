//! Core data model for dutylog.
//!
//! These types describe a trip the way an ELD sees it:
//! stops in, duty intervals through the middle, daily logs and
//! violations out. No logic beyond small accessors lives here.

mod cycle;
mod duty;
mod log;
mod stop;
mod trip;
mod violation;

pub use cycle::CycleState;
pub use duty::{DutyInterval, DutyStatus, Timeline};
pub use log::{DailyLog, GridSegment, HourTotals, Remark};
pub use stop::{Position, Stop, StopKind};
pub use trip::{TripMeta, TripRequest};
pub use violation::{RuleId, Severity, Violation};

use jiff::SignedDuration;

/// Convert fractional hours to a duration at millisecond precision.
///
/// Callers validate that `hours` is finite and non-negative.
#[allow(clippy::cast_possible_truncation)]
pub fn hours_to_duration(hours: f64) -> SignedDuration {
    SignedDuration::from_millis((hours * 3_600_000.0).round() as i64)
}

/// Convert a duration to fractional hours at full precision.
pub fn duration_to_hours(duration: SignedDuration) -> f64 {
    duration.as_secs_f64() / 3600.0
}
