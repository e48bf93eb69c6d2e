//! The engine entry point: stops in, daily logs and a verdict out.
//!
//! Everything here is a pure function of its arguments. Options arrive
//! explicitly; nothing is read from the environment.

use jiff::Timestamp;
use jiff::tz::TimeZone;
use serde::Serialize;
use tracing::debug;

use crate::compliance::{HoursRemaining, evaluate};
use crate::grid::{GridIntegrityError, render_all};
use crate::model::{
    CycleState, DailyLog, DutyStatus, Timeline, TripMeta, TripRequest, Violation,
};
use crate::partition::{DayCalendar, partition};
use crate::planner::{RouteRequest, plan_stops};
use crate::rules::PlanOptions;
use crate::timeline::{ScheduleError, build_timeline};

/// Any reason the engine refuses to produce a report.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Integrity(#[from] GridIntegrityError),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripReport {
    pub trip: TripMeta,

    /// IANA name of the zone that defines the log days.
    pub time_zone: String,

    pub timeline: Timeline,
    pub logs: Vec<DailyLog>,
    pub summary: TripSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSummary {
    /// False iff any violation is blocking.
    pub feasible: bool,

    pub violations: Vec<Violation>,
    pub total_distance_miles: f64,
    pub total_trip_hours: f64,
    pub total_driving_hours: f64,
    pub estimated_arrival: Timestamp,
    pub remaining: HoursRemaining,
    pub final_cycle: CycleState,
}

/// Zone for the trip's calendar days: the trip's own, then the configured
/// default, then UTC.
pub fn resolve_time_zone(
    trip: &TripMeta,
    default_time_zone: Option<&str>,
) -> Result<TimeZone, ScheduleError> {
    let Some(name) = trip.time_zone.as_deref().or(default_time_zone) else {
        return Ok(TimeZone::UTC);
    };
    TimeZone::get(name).map_err(|source| ScheduleError::UnknownTimeZone {
        name: name.to_string(),
        source,
    })
}

/// Build, partition, render and evaluate a trip.
pub fn plan_trip(request: &TripRequest, options: &PlanOptions) -> Result<TripReport, EngineError> {
    let rules = &options.rules;
    rules.validate().map_err(ScheduleError::InvalidRules)?;

    let tz = resolve_time_zone(&request.trip, options.default_time_zone.as_deref())?;
    let time_zone = tz.iana_name().unwrap_or("UTC").to_string();
    let calendar = DayCalendar::new(tz, request.trip.trip_start_utc);

    let timeline = build_timeline(&request.trip, &request.stops, options.restart_status)?;
    let mut logs = render_all(partition(&timeline, &calendar, options.pad_partial_days)?)?;

    let initial = CycleState::new(
        request.trip.cycle_hours_used,
        rules.cycle_limit_hours,
        rules.cycle_days,
    );
    let evaluation = evaluate(&timeline, initial, rules, &calendar);

    for violation in &evaluation.violations {
        let log = logs
            .iter_mut()
            .find(|log| log.day_index == violation.day_index)
            .ok_or(GridIntegrityError::UnknownDay {
                day_index: violation.day_index,
            })?;
        log.violations.push(violation.clone());
    }
    debug!(days = logs.len(), time_zone = %time_zone, "trip report assembled");

    let summary = TripSummary {
        feasible: evaluation.feasible,
        violations: evaluation.violations,
        total_distance_miles: timeline.total_distance_miles(),
        total_trip_hours: timeline.total_hours(),
        total_driving_hours: timeline.hours_in(DutyStatus::Driving),
        estimated_arrival: timeline.end_utc(),
        remaining: evaluation.remaining,
        final_cycle: evaluation.final_cycle,
    };

    Ok(TripReport {
        trip: request.trip.clone(),
        time_zone,
        timeline,
        logs,
        summary,
    })
}

/// Plan stops along a route, then report on the planned trip.
pub fn plan_route(request: &RouteRequest, options: &PlanOptions) -> Result<TripReport, EngineError> {
    let stops = plan_stops(&request.trip, &request.route, &options.rules)?;
    let trip = TripRequest {
        trip: request.trip.clone(),
        stops,
    };
    plan_trip(&trip, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::{Position, RuleId, Severity, Stop, StopKind};
    use crate::planner::{RouteLeg, RouteSummary, Waypoint};

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn trip(start: &str, time_zone: Option<&str>) -> TripMeta {
        TripMeta {
            driver_name: "Dana Reyes".into(),
            co_driver_name: None,
            truck_number: "T-114".into(),
            trailer_number: None,
            cycle_hours_used: 0.0,
            trip_start_utc: ts(start),
            time_zone: time_zone.map(str::to_string),
            start_odometer_miles: 0.0,
        }
    }

    fn stop(kind: StopKind, start: &str, hours: f64, miles: f64) -> Stop {
        Stop {
            kind,
            start_utc: ts(start),
            duration_hours: hours,
            position: Position { lat: 41.0, lng: -88.0 },
            label: "Joliet, IL".into(),
            distance_miles: miles,
            note: None,
        }
    }

    #[test]
    fn zero_stops_yield_one_off_duty_day() {
        let request = TripRequest {
            trip: trip("2025-03-03T15:00:00Z", Some("America/Chicago")),
            stops: vec![],
        };
        let report = plan_trip(&request, &PlanOptions::default()).unwrap();

        assert_eq!(report.logs.len(), 1);
        let log = &report.logs[0];
        assert_eq!(log.day_index, 1);
        assert_eq!(log.totals.off_duty, 24.0);
        assert_eq!(log.totals.sum(), 24.0);
        assert!(report.summary.violations.is_empty());
        assert!(report.summary.feasible);
        assert_eq!(report.time_zone, "America/Chicago");
    }

    #[test]
    fn violations_land_on_their_day() {
        let request = TripRequest {
            trip: trip("2025-03-03T08:00:00Z", None),
            stops: vec![
                stop(StopKind::Pickup, "2025-03-03T08:00:00Z", 1.0, 0.0),
                stop(StopKind::DrivingSegment, "2025-03-03T09:00:00Z", 7.0, 400.0),
                stop(StopKind::Fuel, "2025-03-03T16:00:00Z", 0.5, 0.0),
                stop(StopKind::DrivingSegment, "2025-03-03T16:30:00Z", 4.25, 250.0),
                stop(StopKind::Dropoff, "2025-03-03T20:45:00Z", 1.0, 0.0),
            ],
        };
        let report = plan_trip(&request, &PlanOptions::default()).unwrap();

        assert!(!report.summary.feasible);
        assert_eq!(report.logs.len(), 1);
        let blocking: Vec<_> = report.logs[0]
            .violations
            .iter()
            .filter(|v| v.severity == Severity::Blocking)
            .collect();
        assert_eq!(blocking.len(), 1);
        assert_eq!(blocking[0].rule_id, RuleId::DrivingLimit);
        assert_eq!(report.summary.total_distance_miles, 650.0);
        assert_eq!(report.summary.total_driving_hours, 11.25);
        assert_eq!(report.summary.estimated_arrival, ts("2025-03-03T21:45:00Z"));
        assert_eq!(report.time_zone, "UTC");
    }

    #[test]
    fn warning_at_midnight_lands_on_the_day_it_ends() {
        let request = TripRequest {
            trip: trip("2025-03-03T16:15:00Z", None),
            stops: vec![stop(
                StopKind::DrivingSegment,
                "2025-03-03T16:15:00Z",
                7.75,
                420.0,
            )],
        };
        let report = plan_trip(&request, &PlanOptions::default()).unwrap();

        assert_eq!(report.logs.len(), 1);
        assert_eq!(report.summary.violations.len(), 1);
        assert_eq!(report.summary.violations[0].rule_id, RuleId::BreakRequired);
        assert_eq!(report.summary.violations[0].day_index, 1);
        assert_eq!(report.logs[0].violations.len(), 1);
    }

    #[test]
    fn invalid_schedule_aborts() {
        let request = TripRequest {
            trip: trip("2025-03-03T08:00:00Z", None),
            stops: vec![
                stop(StopKind::Pickup, "2025-03-03T08:00:00Z", 1.0, 0.0),
                stop(StopKind::DrivingSegment, "2025-03-03T09:30:00Z", 2.0, 100.0),
            ],
        };
        let err = plan_trip(&request, &PlanOptions::default()).unwrap_err();
        assert!(matches!(err, EngineError::Schedule(ScheduleError::Gap { index: 1, .. })));
    }

    #[test]
    fn unknown_time_zone_is_rejected() {
        let request = TripRequest {
            trip: trip("2025-03-03T08:00:00Z", Some("Mars/Olympus_Mons")),
            stops: vec![],
        };
        let err = plan_trip(&request, &PlanOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Schedule(ScheduleError::UnknownTimeZone { .. })
        ));
    }

    #[test]
    fn default_time_zone_applies_when_trip_has_none() {
        let options = PlanOptions {
            default_time_zone: Some("America/Denver".into()),
            ..PlanOptions::default()
        };
        let request = TripRequest {
            trip: trip("2025-03-03T08:00:00Z", None),
            stops: vec![],
        };
        let report = plan_trip(&request, &options).unwrap();
        assert_eq!(report.time_zone, "America/Denver");
    }

    #[test]
    fn planned_route_is_feasible() {
        let at = |label: &str, lat: f64, lng: f64| Waypoint {
            label: label.into(),
            position: Position { lat, lng },
        };
        let chicago = at("Chicago, IL", 41.88, -87.63);
        let omaha = at("Omaha, NE", 41.26, -95.93);
        let denver = at("Denver, CO", 39.74, -104.99);
        let request = RouteRequest {
            trip: trip("2025-03-03T13:00:00Z", Some("America/Chicago")),
            route: RouteSummary {
                legs: vec![
                    RouteLeg {
                        from: chicago,
                        to: omaha.clone(),
                        distance_miles: 470.0,
                        driving_hours: 7.0,
                    },
                    RouteLeg {
                        from: omaha,
                        to: denver,
                        distance_miles: 540.0,
                        driving_hours: 8.0,
                    },
                ],
            },
        };
        let report = plan_route(&request, &PlanOptions::default()).unwrap();

        assert!(report.summary.feasible, "{:?}", report.summary.violations);
        assert!(report.logs.len() >= 2);
        assert!((report.summary.total_distance_miles - 1010.0).abs() < 1e-6);
        for log in &report.logs {
            assert!(log.totals.driving <= 11.0 + 1e-9);
        }
    }
}
