//! dutylog: Hours-of-Service daily logs for property-carrying drivers.
//!
//! A trip goes in as an ordered list of stops. Out come a validated duty
//! timeline, one log per calendar day in the trip's time zone with hour
//! totals per duty status, and the HOS violations found along the way.
//!
//! The pipeline is four pure stages, each usable on its own:
//!
//! 1. [`timeline::build_timeline`] turns stops into contiguous duty intervals.
//! 2. [`partition::partition`] splits the timeline at local midnights.
//! 3. [`grid::render`] fills in hour totals and checks each day's integrity.
//! 4. [`compliance::evaluate`] runs the 11/14/8/70 rules in one forward pass.
//!
//! [`report::plan_trip`] chains them. [`planner::plan_stops`] goes one step
//! earlier and lays out a legal stop list from a route summary.

pub mod compliance;
pub mod grid;
pub mod model;
pub mod partition;
pub mod planner;
pub mod report;
pub mod rules;
pub mod timeline;

pub use report::{EngineError, TripReport, TripSummary, plan_route, plan_trip};
pub use rules::{HosRules, PlanOptions, RestartStatus};
