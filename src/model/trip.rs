//! Trip-level metadata and the request handed to the engine.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::stop::Stop;

/// Who is driving what, and where the driver stands before the trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripMeta {
    pub driver_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co_driver_name: Option<String>,

    pub truck_number: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trailer_number: Option<String>,

    /// On-duty hours already used in the current cycle.
    #[serde(default)]
    pub cycle_hours_used: f64,

    pub trip_start_utc: Timestamp,

    /// IANA name that defines calendar days for the whole trip.
    /// Falls back to the configured default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,

    #[serde(default)]
    pub start_odometer_miles: f64,
}

/// Everything the engine needs to produce daily logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRequest {
    pub trip: TripMeta,

    #[serde(default)]
    pub stops: Vec<Stop>,
}
