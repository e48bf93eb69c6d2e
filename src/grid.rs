//! Grid rendering: hour totals per duty status, with an integrity check.
//!
//! The resolution-agnostic segment view lives on [`DailyLog`] itself
//! (`segments` and `buckets`); this module fills in totals and refuses to
//! hand out a day whose intervals do not add up.

use jiff::Timestamp;

use crate::model::{DailyLog, HourTotals, duration_to_hours};

/// Allowed difference, in hours, between summed totals and covered time.
pub const TOLERANCE_HOURS: f64 = 1e-6;

/// A day that fails its own invariants. Always a defect in the engine.
#[derive(Debug, thiserror::Error)]
pub enum GridIntegrityError {
    #[error("day {day_index}: totals sum to {total:.6} h but intervals cover {covered:.6} h")]
    TotalsMismatch {
        day_index: u32,
        total: f64,
        covered: f64,
    },

    #[error("day {day_index}: interval starting {at} does not meet the previous one")]
    NotContiguous { day_index: u32, at: Timestamp },

    #[error("day {day_index}: interval {start} to {end} lies outside the day")]
    OutsideDay {
        day_index: u32,
        start: Timestamp,
        end: Timestamp,
    },

    #[error("day {day_index}: empty interval at {at}")]
    EmptyInterval { day_index: u32, at: Timestamp },

    #[error("violation names day {day_index}, which has no log")]
    UnknownDay { day_index: u32 },
}

/// Compute hour totals for one day.
pub fn render(mut log: DailyLog) -> Result<DailyLog, GridIntegrityError> {
    let day_index = log.day_index;
    let mut totals = HourTotals::default();
    let mut previous_end: Option<Timestamp> = None;

    for interval in &log.intervals {
        if interval.end_utc <= interval.start_utc {
            return Err(GridIntegrityError::EmptyInterval {
                day_index,
                at: interval.start_utc,
            });
        }
        if interval.start_utc < log.day_start_utc || interval.end_utc > log.day_end_utc {
            return Err(GridIntegrityError::OutsideDay {
                day_index,
                start: interval.start_utc,
                end: interval.end_utc,
            });
        }
        if let Some(end) = previous_end
            && end != interval.start_utc
        {
            return Err(GridIntegrityError::NotContiguous {
                day_index,
                at: interval.start_utc,
            });
        }
        previous_end = Some(interval.end_utc);
        totals.add(interval.status, interval.hours());
    }

    let covered = duration_to_hours(log.covered());
    let total = totals.sum();
    if (total - covered).abs() > TOLERANCE_HOURS {
        return Err(GridIntegrityError::TotalsMismatch {
            day_index,
            total,
            covered,
        });
    }

    log.totals = totals;
    Ok(log)
}

/// Render every day, stopping at the first defect.
pub fn render_all(logs: Vec<DailyLog>) -> Result<Vec<DailyLog>, GridIntegrityError> {
    logs.into_iter().map(render).collect()
}
