//! Cycle state: where the driver stands against the weekly budget.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Snapshot of a driver's cycle.
///
/// Only the compliance evaluator produces new values; the final state of one
/// evaluation can seed the next trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleState {
    /// On-duty hours inside the trailing cycle window.
    pub hours_used_in_cycle: f64,

    /// On-duty budget for the cycle window (70 for the 70-hour/8-day rule).
    pub cycle_window_hours: f64,

    /// Length of the trailing window in days.
    pub cycle_window_days: u32,

    /// End of the most recent qualifying reset, if one has been seen.
    pub last_off_duty_reset: Option<Timestamp>,
}

impl CycleState {
    pub fn new(hours_used_in_cycle: f64, cycle_window_hours: f64, cycle_window_days: u32) -> Self {
        Self {
            hours_used_in_cycle,
            cycle_window_hours,
            cycle_window_days,
            last_off_duty_reset: None,
        }
    }

    pub fn hours_available(&self) -> f64 {
        (self.cycle_window_hours - self.hours_used_in_cycle).max(0.0)
    }
}
