//! Schedule planning: lay out stops along a route so the trip stays legal.
//!
//! Route geometry comes from elsewhere; this module only needs, for each
//! leg, where it starts and ends, how far it is, and how long it takes to
//! drive. Driving is chopped into segments and the required breaks, fuel
//! stops, resets and restarts are slotted in between.
//!
//! All bookkeeping is in whole seconds so the planned durations survive the
//! trip through fractional hours unchanged.

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{Position, Stop, StopKind, TripMeta};
use crate::rules::HosRules;
use crate::timeline::ScheduleError;

/// A named point at the end of a leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub label: String,
    pub position: Position,
}

/// One leg of the route as reported by the routing service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteLeg {
    pub from: Waypoint,
    pub to: Waypoint,
    pub distance_miles: f64,
    pub driving_hours: f64,
}

/// The route between current location, pickup, and dropoff.
///
/// The first leg ends at the pickup and the last at the dropoff. A single
/// leg means the driver is already at the pickup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RouteSummary {
    pub legs: Vec<RouteLeg>,
}

impl RouteSummary {
    pub fn distance_miles(&self) -> f64 {
        self.legs.iter().map(|l| l.distance_miles).sum()
    }
}

/// Trip metadata plus a route, for planning from scratch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub trip: TripMeta,
    pub route: RouteSummary,
}

/// Plan a contiguous stop schedule for the route.
pub fn plan_stops(
    trip: &TripMeta,
    route: &RouteSummary,
    rules: &HosRules,
) -> Result<Vec<Stop>, ScheduleError> {
    rules.validate().map_err(ScheduleError::InvalidRules)?;
    for (index, leg) in route.legs.iter().enumerate() {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !valid(leg.distance_miles) || !valid(leg.driving_hours) {
            return Err(ScheduleError::InvalidLeg { index });
        }
    }
    let (Some(first), Some(last)) = (route.legs.first(), route.legs.last()) else {
        return Ok(Vec::new());
    };

    let mut planner = Planner::new(trip, rules, &first.from);
    if route.legs.len() == 1 {
        planner.load(&first.from)?;
    }
    for (index, leg) in route.legs.iter().enumerate() {
        planner.drive(leg)?;
        if index == 0 && route.legs.len() > 1 {
            planner.load(&leg.to)?;
        }
    }
    planner.unload(&last.to)?;

    debug!(
        stops = planner.stops.len(),
        miles = route.distance_miles(),
        "planned schedule"
    );
    Ok(planner.stops)
}

/// Limits in seconds.
struct Limits {
    driving: i64,
    window: i64,
    break_after: i64,
    break_len: i64,
    reset: i64,
    restart: Option<i64>,
    cycle: i64,
    fuel: i64,
    pickup: i64,
    dropoff: i64,
}

#[allow(clippy::cast_possible_truncation)]
fn secs(hours: f64) -> i64 {
    (hours * 3600.0).round() as i64
}

#[allow(clippy::cast_precision_loss)]
fn to_hours(secs: i64) -> f64 {
    secs as f64 / 3600.0
}

struct Planner<'a> {
    rules: &'a HosRules,
    limits: Limits,
    stops: Vec<Stop>,
    now: Timestamp,
    position: Position,
    label: String,

    driving_since_reset: i64,
    on_duty_since_reset: i64,
    driving_since_break: i64,
    non_driving_run: i64,
    rest_run: i64,
    cycle_used: i64,
    miles_since_fuel: f64,
}

impl<'a> Planner<'a> {
    fn new(trip: &TripMeta, rules: &'a HosRules, start: &Waypoint) -> Self {
        Self {
            rules,
            limits: Limits {
                driving: secs(rules.driving_limit_hours),
                window: secs(rules.duty_window_hours),
                break_after: secs(rules.break_after_driving_hours),
                break_len: secs(rules.break_minutes / 60.0),
                reset: secs(rules.reset_hours),
                restart: rules.restart_hours.map(secs),
                cycle: secs(rules.cycle_limit_hours),
                fuel: secs(rules.fuel_minutes / 60.0),
                pickup: secs(rules.pickup_hours),
                dropoff: secs(rules.dropoff_hours),
            },
            stops: Vec::new(),
            now: trip.trip_start_utc,
            position: start.position,
            label: start.label.clone(),
            driving_since_reset: 0,
            on_duty_since_reset: 0,
            driving_since_break: 0,
            non_driving_run: 0,
            rest_run: 0,
            cycle_used: secs(trip.cycle_hours_used.max(0.0)),
            miles_since_fuel: 0.0,
        }
    }

    fn load(&mut self, at: &Waypoint) -> Result<(), ScheduleError> {
        self.arrive(at);
        let note = format!("Loading at {}", at.label);
        self.on_duty(StopKind::Pickup, self.limits.pickup, note)
    }

    fn unload(&mut self, at: &Waypoint) -> Result<(), ScheduleError> {
        self.arrive(at);
        let note = format!("Unloading at {}", at.label);
        self.on_duty(StopKind::Dropoff, self.limits.dropoff, note)
    }

    fn arrive(&mut self, at: &Waypoint) {
        self.position = at.position;
        self.label.clone_from(&at.label);
    }

    fn drive(&mut self, leg: &RouteLeg) -> Result<(), ScheduleError> {
        let total = secs(leg.driving_hours);
        #[allow(clippy::cast_precision_loss)]
        let miles_per_sec = if total > 0 {
            leg.distance_miles / total as f64
        } else {
            0.0
        };
        let en_route = format!("En route to {}", leg.to.label);

        let mut done = 0;
        while done < total {
            #[allow(clippy::cast_precision_loss)]
            let progress = done as f64 / total as f64;
            self.position = leg.from.position.lerp(leg.to.position, progress);
            self.label.clone_from(&en_route);

            if self.cycle_left() <= 0 && self.limits.restart.is_some() {
                self.restart()?;
                continue;
            }
            if self.driving_left() <= 0 || self.window_left() <= 0 {
                self.reset()?;
                continue;
            }
            if self.break_left() <= 0 {
                self.rest(self.limits.break_len, "30-minute break")?;
                continue;
            }
            if self.fuel_due() {
                self.on_duty(StopKind::Fuel, self.limits.fuel, "Fuel stop".to_string())?;
                self.miles_since_fuel = 0.0;
                continue;
            }

            let mut chunk = (total - done)
                .min(self.driving_left())
                .min(self.window_left())
                .min(self.break_left());
            if self.limits.restart.is_some() {
                chunk = chunk.min(self.cycle_left());
            }
            if miles_per_sec > 0.0 && self.rules.fuel_interval_miles > 0.0 {
                let to_fuel = (self.rules.fuel_interval_miles - self.miles_since_fuel) / miles_per_sec;
                #[allow(clippy::cast_possible_truncation)]
                let to_fuel = to_fuel.ceil().max(1.0) as i64;
                chunk = chunk.min(to_fuel);
            }

            #[allow(clippy::cast_precision_loss)]
            let miles = miles_per_sec * chunk as f64;
            self.push(StopKind::DrivingSegment, chunk, miles, None)?;
            self.driving_since_reset += chunk;
            self.on_duty_since_reset += chunk;
            self.driving_since_break += chunk;
            self.cycle_used += chunk;
            self.non_driving_run = 0;
            self.rest_run = 0;
            self.miles_since_fuel += miles;
            done += chunk;
        }

        self.arrive(&leg.to);
        Ok(())
    }

    /// On-duty, not-driving work, preceded by a reset or restart if it
    /// would not fit.
    fn on_duty(&mut self, kind: StopKind, len: i64, note: String) -> Result<(), ScheduleError> {
        if len <= 0 {
            return Ok(());
        }
        if self.cycle_left() < len && self.limits.restart.is_some() {
            self.restart()?;
        } else if self.window_left() < len {
            self.reset()?;
        }
        self.push(kind, len, 0.0, Some(note))?;
        self.on_duty_since_reset += len;
        self.cycle_used += len;
        self.rest_run = 0;
        self.take_non_driving(len);
        Ok(())
    }

    fn reset(&mut self) -> Result<(), ScheduleError> {
        self.rest(self.limits.reset, "10-hour reset")
    }

    fn restart(&mut self) -> Result<(), ScheduleError> {
        let Some(len) = self.limits.restart else {
            return Ok(());
        };
        self.push(StopKind::Restart, len, 0.0, Some("34-hour restart".to_string()))?;
        self.rested(len);
        self.cycle_used = 0;
        Ok(())
    }

    fn rest(&mut self, len: i64, note: &str) -> Result<(), ScheduleError> {
        self.push(StopKind::Rest, len, 0.0, Some(note.to_string()))?;
        self.rested(len);
        Ok(())
    }

    fn rested(&mut self, len: i64) {
        self.rest_run += len;
        self.take_non_driving(len);
        if self.rest_run >= self.limits.reset {
            self.driving_since_reset = 0;
            self.on_duty_since_reset = 0;
            self.driving_since_break = 0;
        }
        if let Some(restart) = self.limits.restart
            && self.rest_run >= restart
        {
            self.cycle_used = 0;
        }
    }

    fn take_non_driving(&mut self, len: i64) {
        self.non_driving_run += len;
        if self.non_driving_run >= self.limits.break_len {
            self.driving_since_break = 0;
        }
    }

    fn push(
        &mut self,
        kind: StopKind,
        len: i64,
        distance_miles: f64,
        note: Option<String>,
    ) -> Result<(), ScheduleError> {
        self.stops.push(Stop {
            kind,
            start_utc: self.now,
            duration_hours: to_hours(len),
            position: self.position,
            label: self.label.clone(),
            distance_miles,
            note,
        });
        self.now = self.now.checked_add(SignedDuration::from_secs(len))?;
        Ok(())
    }

    fn driving_left(&self) -> i64 {
        self.limits.driving - self.driving_since_reset
    }

    fn window_left(&self) -> i64 {
        self.limits.window - self.on_duty_since_reset
    }

    fn break_left(&self) -> i64 {
        self.limits.break_after - self.driving_since_break
    }

    fn cycle_left(&self) -> i64 {
        self.limits.cycle - self.cycle_used
    }

    fn fuel_due(&self) -> bool {
        self.rules.fuel_interval_miles > 0.0
            && self.miles_since_fuel + 1e-6 >= self.rules.fuel_interval_miles
    }
}
