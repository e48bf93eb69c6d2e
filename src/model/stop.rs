//! Stop types: the schedule handed over by route planning.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// What happens at a stop or along a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StopKind {
    /// Loading at the shipper.
    Pickup,

    /// Unloading at the receiver.
    Dropoff,

    Fuel,

    /// A rest or required break, logged off duty.
    Rest,

    /// An overnight or 34-hour restart. Logged as sleeper berth or
    /// off duty depending on the configured restart status.
    Restart,

    /// Time behind the wheel between two points.
    DrivingSegment,
}

/// A point on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

impl Position {
    /// Point at `fraction` of the straight line from `self` to `other`.
    pub fn lerp(self, other: Self, fraction: f64) -> Self {
        Self {
            lat: self.lat + (other.lat - self.lat) * fraction,
            lng: self.lng + (other.lng - self.lng) * fraction,
        }
    }
}

/// One entry of the trip schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub kind: StopKind,

    /// Declared start. Must equal the computed end of the previous stop.
    pub start_utc: Timestamp,

    pub duration_hours: f64,

    pub position: Position,

    /// Human-readable location, copied onto the duty interval.
    pub label: String,

    /// Miles covered. Only meaningful for driving segments.
    #[serde(default)]
    pub distance_miles: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}
