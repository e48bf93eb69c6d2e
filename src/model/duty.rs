//! Duty status types: what the driver was doing, and when.

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use super::duration_to_hours;

/// One of the four ELD duty statuses.
///
/// Exactly one is active at any instant of a trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DutyStatus {
    OffDuty,
    SleeperBerth,
    Driving,
    OnDutyNotDriving,
}

impl DutyStatus {
    /// Grid row order on a paper log sheet, top to bottom.
    pub const ALL: [Self; 4] = [
        Self::OffDuty,
        Self::SleeperBerth,
        Self::Driving,
        Self::OnDutyNotDriving,
    ];

    /// Driving or on duty: counts against the duty window and the cycle.
    pub fn is_on_duty(self) -> bool {
        matches!(self, Self::Driving | Self::OnDutyNotDriving)
    }

    /// Off duty or in the sleeper berth: counts toward a reset.
    pub fn is_rest(self) -> bool {
        !self.is_on_duty()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::OffDuty => "Off Duty",
            Self::SleeperBerth => "Sleeper Berth",
            Self::Driving => "Driving",
            Self::OnDutyNotDriving => "On Duty (Not Driving)",
        }
    }
}

/// A span of time spent in a single duty status.
///
/// Location and odometer are stamped when the interval is created,
/// never re-derived from notes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DutyInterval {
    pub status: DutyStatus,

    pub start_utc: Timestamp,

    /// Exclusive. Always after `start_utc`.
    pub end_utc: Timestamp,

    /// Where the status began (city, facility, or highway description).
    pub location_label: String,

    /// Odometer reading at `start_utc`.
    pub odometer_miles: f64,

    /// Miles covered during the interval. Zero unless driving.
    #[serde(default)]
    pub distance_miles: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl DutyInterval {
    pub fn duration(&self) -> SignedDuration {
        self.end_utc.duration_since(self.start_utc)
    }

    pub fn hours(&self) -> f64 {
        duration_to_hours(self.duration())
    }

    /// Odometer reading at `end_utc`.
    pub fn end_odometer_miles(&self) -> f64 {
        self.odometer_miles + self.distance_miles
    }
}

/// The contiguous, ordered sequence of duty intervals for one trip.
///
/// Built once by the timeline builder and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    start_utc: Timestamp,

    /// Odometer reading when the trip starts.
    #[serde(default)]
    start_odometer_miles: f64,

    intervals: Vec<DutyInterval>,
}

impl Timeline {
    /// Callers must supply contiguous, ordered intervals starting at `start_utc`.
    pub(crate) fn new(
        start_utc: Timestamp,
        start_odometer_miles: f64,
        intervals: Vec<DutyInterval>,
    ) -> Self {
        Self {
            start_utc,
            start_odometer_miles,
            intervals,
        }
    }

    pub fn intervals(&self) -> &[DutyInterval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn start_utc(&self) -> Timestamp {
        self.start_utc
    }

    pub fn start_odometer_miles(&self) -> f64 {
        self.start_odometer_miles
    }

    /// End of the last interval, or the start when the timeline is empty.
    pub fn end_utc(&self) -> Timestamp {
        self.intervals.last().map_or(self.start_utc, |i| i.end_utc)
    }

    pub fn total_hours(&self) -> f64 {
        duration_to_hours(self.end_utc().duration_since(self.start_utc))
    }

    pub fn hours_in(&self, status: DutyStatus) -> f64 {
        self.intervals
            .iter()
            .filter(|i| i.status == status)
            .map(DutyInterval::hours)
            .sum()
    }

    pub fn total_distance_miles(&self) -> f64 {
        self.intervals.iter().map(|i| i.distance_miles).sum()
    }
}
