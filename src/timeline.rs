//! Timeline construction: from a stop schedule to contiguous duty intervals.
//!
//! The schedule must already be contiguous. A gap or overlap between the
//! declared start of a stop and the computed end of the one before it is an
//! upstream scheduling bug, so it is reported rather than papered over.

use jiff::{SignedDuration, Timestamp};
use tracing::debug;

use crate::model::{DutyInterval, DutyStatus, Stop, StopKind, Timeline, TripMeta, hours_to_duration};
use crate::rules::RestartStatus;

/// Drift allowed between a declared start and the computed one.
/// Absorbs sub-second rounding from fractional-hour durations.
pub const CONTIGUITY_TOLERANCE: SignedDuration = SignedDuration::from_secs(1);

/// Errors that reject a trip schedule outright.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("trip starts at {trip_start} but the first stop starts at {stop_start}")]
    StartMismatch {
        trip_start: Timestamp,
        stop_start: Timestamp,
    },

    #[error("stop {index} starts at {start}, before the previous stop at {previous}")]
    NotTimeOrdered {
        index: usize,
        start: Timestamp,
        previous: Timestamp,
    },

    #[error("gap before stop {index}: previous stop ends at {expected}, stop starts at {found}")]
    Gap {
        index: usize,
        expected: Timestamp,
        found: Timestamp,
    },

    #[error("stop {index} overlaps the previous stop: previous ends at {expected}, stop starts at {found}")]
    Overlap {
        index: usize,
        expected: Timestamp,
        found: Timestamp,
    },

    #[error("stop {index} has invalid duration: {hours} hours")]
    InvalidDuration { index: usize, hours: f64 },

    #[error("stop {index} has invalid distance: {miles} miles")]
    InvalidDistance { index: usize, miles: f64 },

    #[error("route leg {index} has invalid driving time or distance")]
    InvalidLeg { index: usize },

    #[error("invalid rules: {0}")]
    InvalidRules(String),

    #[error("unknown time zone '{name}': {source}")]
    UnknownTimeZone { name: String, source: jiff::Error },

    #[error("time outside the supported calendar range: {0}")]
    OutOfRange(#[from] jiff::Error),
}

/// Duty status logged for a stop of the given kind.
pub fn status_for(kind: StopKind, restart: RestartStatus) -> DutyStatus {
    match kind {
        StopKind::DrivingSegment => DutyStatus::Driving,
        StopKind::Pickup | StopKind::Dropoff | StopKind::Fuel => DutyStatus::OnDutyNotDriving,
        StopKind::Rest => DutyStatus::OffDuty,
        StopKind::Restart => restart.into(),
    }
}

/// Build the trip's timeline from its stop schedule.
///
/// Each stop becomes one interval of its declared duration, starting where
/// the previous one ended. Zero-length stops leave no interval. Adjacent
/// intervals with the same status are merged.
pub fn build_timeline(
    trip: &TripMeta,
    stops: &[Stop],
    restart: RestartStatus,
) -> Result<Timeline, ScheduleError> {
    let start = trip.trip_start_utc;
    let mut cursor = start;
    let mut odometer = trip.start_odometer_miles;
    let mut previous_start: Option<Timestamp> = None;
    let mut intervals: Vec<DutyInterval> = Vec::with_capacity(stops.len());

    for (index, stop) in stops.iter().enumerate() {
        if !stop.duration_hours.is_finite() || stop.duration_hours < 0.0 {
            return Err(ScheduleError::InvalidDuration {
                index,
                hours: stop.duration_hours,
            });
        }
        if !stop.distance_miles.is_finite() || stop.distance_miles < 0.0 {
            return Err(ScheduleError::InvalidDistance {
                index,
                miles: stop.distance_miles,
            });
        }
        if let Some(previous) = previous_start
            && stop.start_utc < previous
        {
            return Err(ScheduleError::NotTimeOrdered {
                index,
                start: stop.start_utc,
                previous,
            });
        }
        check_contiguous(index, cursor, stop.start_utc, start)?;
        previous_start = Some(stop.start_utc);

        let duration = hours_to_duration(stop.duration_hours);
        if duration.is_zero() {
            continue;
        }

        let status = status_for(stop.kind, restart);
        let distance = if status == DutyStatus::Driving {
            stop.distance_miles
        } else {
            0.0
        };
        let end = cursor.checked_add(duration)?;

        push_merged(
            &mut intervals,
            DutyInterval {
                status,
                start_utc: cursor,
                end_utc: end,
                location_label: stop.label.clone(),
                odometer_miles: odometer,
                distance_miles: distance,
                note: stop.note.clone(),
            },
        );
        odometer += distance;
        cursor = end;
    }

    debug!(
        stops = stops.len(),
        intervals = intervals.len(),
        "built timeline"
    );
    Ok(Timeline::new(start, trip.start_odometer_miles, intervals))
}

fn check_contiguous(
    index: usize,
    expected: Timestamp,
    found: Timestamp,
    trip_start: Timestamp,
) -> Result<(), ScheduleError> {
    let drift = found.duration_since(expected);
    if drift.abs() <= CONTIGUITY_TOLERANCE {
        return Ok(());
    }
    if index == 0 {
        return Err(ScheduleError::StartMismatch {
            trip_start,
            stop_start: found,
        });
    }
    if drift.is_positive() {
        Err(ScheduleError::Gap {
            index,
            expected,
            found,
        })
    } else {
        Err(ScheduleError::Overlap {
            index,
            expected,
            found,
        })
    }
}

/// Append, folding into the last interval when the status repeats.
fn push_merged(intervals: &mut Vec<DutyInterval>, next: DutyInterval) {
    if let Some(last) = intervals.last_mut()
        && last.status == next.status
        && last.end_utc == next.start_utc
    {
        last.end_utc = next.end_utc;
        last.distance_miles += next.distance_miles;
        last.note = match (last.note.take(), next.note) {
            (Some(a), Some(b)) if a != b => Some(format!("{a}; {b}")),
            (a, b) => a.or(b),
        };
        return;
    }
    intervals.push(next);
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::Position;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn trip(start: &str) -> TripMeta {
        TripMeta {
            driver_name: "Dana Reyes".into(),
            co_driver_name: None,
            truck_number: "T-114".into(),
            trailer_number: None,
            cycle_hours_used: 0.0,
            trip_start_utc: ts(start),
            time_zone: None,
            start_odometer_miles: 1000.0,
        }
    }

    fn stop(kind: StopKind, start: &str, hours: f64) -> Stop {
        Stop {
            kind,
            start_utc: ts(start),
            duration_hours: hours,
            position: Position {
                lat: 41.52,
                lng: -88.08,
            },
            label: format!("{kind:?} site"),
            distance_miles: if kind == StopKind::DrivingSegment {
                hours * 55.0
            } else {
                0.0
            },
            note: None,
        }
    }

    #[test]
    fn maps_each_stop_to_one_interval() {
        let stops = vec![
            stop(StopKind::Pickup, "2025-03-03T08:00:00Z", 1.0),
            stop(StopKind::DrivingSegment, "2025-03-03T09:00:00Z", 4.0),
            stop(StopKind::Rest, "2025-03-03T13:00:00Z", 0.5),
            stop(StopKind::DrivingSegment, "2025-03-03T13:30:00Z", 3.5),
            stop(StopKind::Dropoff, "2025-03-03T17:00:00Z", 1.0),
        ];
        let timeline =
            build_timeline(&trip("2025-03-03T08:00:00Z"), &stops, RestartStatus::default()).unwrap();

        let statuses: Vec<_> = timeline.intervals().iter().map(|i| i.status).collect();
        assert_eq!(
            statuses,
            vec![
                DutyStatus::OnDutyNotDriving,
                DutyStatus::Driving,
                DutyStatus::OffDuty,
                DutyStatus::Driving,
                DutyStatus::OnDutyNotDriving,
            ]
        );
        assert_eq!(timeline.start_utc(), ts("2025-03-03T08:00:00Z"));
        assert_eq!(timeline.end_utc(), ts("2025-03-03T18:00:00Z"));
    }

    #[test]
    fn intervals_are_contiguous_and_cover_the_trip() {
        let stops = vec![
            stop(StopKind::DrivingSegment, "2025-03-03T08:00:00Z", 2.25),
            stop(StopKind::Fuel, "2025-03-03T10:15:00Z", 0.5),
            stop(StopKind::DrivingSegment, "2025-03-03T10:45:00Z", 1.0 / 3.0),
            stop(StopKind::Rest, "2025-03-03T11:05:00Z", 10.0),
        ];
        let timeline =
            build_timeline(&trip("2025-03-03T08:00:00Z"), &stops, RestartStatus::default()).unwrap();

        for pair in timeline.intervals().windows(2) {
            assert_eq!(pair[0].end_utc, pair[1].start_utc);
        }
        assert!((timeline.total_hours() - (13.0 + 1.0 / 12.0)).abs() < 1e-9);
        assert_eq!(timeline.end_utc(), ts("2025-03-03T21:05:00Z"));
    }

    #[test]
    fn merges_adjacent_same_status() {
        let mut fuel = stop(StopKind::Fuel, "2025-03-03T09:00:00Z", 0.5);
        fuel.note = Some("Fuel stop".into());
        let stops = vec![
            stop(StopKind::Pickup, "2025-03-03T08:00:00Z", 1.0),
            fuel,
            stop(StopKind::DrivingSegment, "2025-03-03T09:30:00Z", 2.0),
            stop(StopKind::DrivingSegment, "2025-03-03T11:30:00Z", 2.0),
        ];
        let timeline =
            build_timeline(&trip("2025-03-03T08:00:00Z"), &stops, RestartStatus::default()).unwrap();

        let intervals = timeline.intervals();
        assert_eq!(intervals.len(), 2);
        assert_eq!(intervals[0].hours(), 1.5);
        assert_eq!(intervals[0].location_label, "Pickup site");
        assert_eq!(intervals[0].note.as_deref(), Some("Fuel stop"));
        assert_eq!(intervals[1].hours(), 4.0);
        assert_eq!(intervals[1].distance_miles, 220.0);
    }

    #[test]
    fn stamps_odometer_at_creation() {
        let stops = vec![
            stop(StopKind::DrivingSegment, "2025-03-03T08:00:00Z", 2.0),
            stop(StopKind::Fuel, "2025-03-03T10:00:00Z", 0.5),
            stop(StopKind::DrivingSegment, "2025-03-03T10:30:00Z", 1.0),
        ];
        let timeline =
            build_timeline(&trip("2025-03-03T08:00:00Z"), &stops, RestartStatus::default()).unwrap();

        let intervals = timeline.intervals();
        assert_eq!(intervals[0].odometer_miles, 1000.0);
        assert_eq!(intervals[1].odometer_miles, 1110.0);
        assert_eq!(intervals[1].distance_miles, 0.0);
        assert_eq!(intervals[2].end_odometer_miles(), 1165.0);
        assert_eq!(timeline.total_distance_miles(), 165.0);
    }

    #[test]
    fn restart_status_follows_policy() {
        let stops = vec![stop(StopKind::Restart, "2025-03-03T08:00:00Z", 34.0)];
        let start = trip("2025-03-03T08:00:00Z");

        let sleeper = build_timeline(&start, &stops, RestartStatus::SleeperBerth).unwrap();
        assert_eq!(sleeper.intervals()[0].status, DutyStatus::SleeperBerth);

        let off = build_timeline(&start, &stops, RestartStatus::OffDuty).unwrap();
        assert_eq!(off.intervals()[0].status, DutyStatus::OffDuty);
    }

    #[test]
    fn zero_stops_yield_an_empty_timeline() {
        let timeline =
            build_timeline(&trip("2025-03-03T08:00:00Z"), &[], RestartStatus::default()).unwrap();
        assert!(timeline.is_empty());
        assert_eq!(timeline.end_utc(), timeline.start_utc());
    }

    #[test]
    fn zero_length_stops_leave_no_interval() {
        let stops = vec![
            stop(StopKind::Pickup, "2025-03-03T08:00:00Z", 0.0),
            stop(StopKind::Dropoff, "2025-03-03T08:00:00Z", 0.0),
        ];
        let timeline =
            build_timeline(&trip("2025-03-03T08:00:00Z"), &stops, RestartStatus::default()).unwrap();
        assert!(timeline.is_empty());
    }

    #[test]
    fn rejects_gap() {
        let stops = vec![
            stop(StopKind::Pickup, "2025-03-03T08:00:00Z", 1.0),
            stop(StopKind::DrivingSegment, "2025-03-03T09:15:00Z", 2.0),
        ];
        let err = build_timeline(&trip("2025-03-03T08:00:00Z"), &stops, RestartStatus::default())
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Gap { index: 1, .. }));
    }

    #[test]
    fn rejects_overlap() {
        let stops = vec![
            stop(StopKind::Pickup, "2025-03-03T08:00:00Z", 1.0),
            stop(StopKind::DrivingSegment, "2025-03-03T08:45:00Z", 2.0),
        ];
        let err = build_timeline(&trip("2025-03-03T08:00:00Z"), &stops, RestartStatus::default())
            .unwrap_err();
        assert!(matches!(err, ScheduleError::Overlap { index: 1, .. }));
    }

    #[test]
    fn rejects_out_of_order_stops() {
        let stops = vec![
            stop(StopKind::Pickup, "2025-03-03T08:00:00Z", 1.0),
            stop(StopKind::DrivingSegment, "2025-03-03T07:00:00Z", 2.0),
        ];
        let err = build_timeline(&trip("2025-03-03T08:00:00Z"), &stops, RestartStatus::default())
            .unwrap_err();
        assert!(matches!(err, ScheduleError::NotTimeOrdered { index: 1, .. }));
    }

    #[test]
    fn rejects_first_stop_away_from_trip_start() {
        let stops = vec![stop(StopKind::Pickup, "2025-03-03T09:00:00Z", 1.0)];
        let err = build_timeline(&trip("2025-03-03T08:00:00Z"), &stops, RestartStatus::default())
            .unwrap_err();
        assert!(matches!(err, ScheduleError::StartMismatch { .. }));
    }

    #[test]
    fn rejects_negative_duration() {
        let stops = vec![stop(StopKind::Pickup, "2025-03-03T08:00:00Z", -1.0)];
        let err = build_timeline(&trip("2025-03-03T08:00:00Z"), &stops, RestartStatus::default())
            .unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidDuration { index: 0, .. }));
    }

    #[test]
    fn tolerates_sub_second_drift() {
        let stops = vec![
            stop(StopKind::DrivingSegment, "2025-03-03T08:00:00Z", 1.0 / 3.0),
            stop(StopKind::Rest, "2025-03-03T08:20:00.4Z", 1.0),
        ];
        let timeline =
            build_timeline(&trip("2025-03-03T08:00:00Z"), &stops, RestartStatus::default()).unwrap();
        assert_eq!(timeline.intervals()[1].start_utc, timeline.intervals()[0].end_utc);
    }
}
