//! Hours-of-Service limits and engine options.
//!
//! Defaults follow the property-carrying 70-hour/8-day rules. Every value can
//! be overridden from the `[rules]` table of the config file.

use serde::{Deserialize, Serialize};

use crate::model::DutyStatus;

/// Regulatory limits, in hours unless the name says otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HosRules {
    pub driving_limit_hours: f64,
    pub duty_window_hours: f64,
    pub break_after_driving_hours: f64,
    pub break_minutes: f64,
    pub reset_hours: f64,

    /// Off-duty run that clears the cycle. `None` disables restarts.
    pub restart_hours: Option<f64>,

    pub cycle_limit_hours: f64,
    pub cycle_days: u32,

    /// How close to a limit earns a warning.
    pub warning_margin_minutes: f64,

    // Planner constants.
    pub fuel_interval_miles: f64,
    pub fuel_minutes: f64,
    pub pickup_hours: f64,
    pub dropoff_hours: f64,
}

impl Default for HosRules {
    fn default() -> Self {
        Self {
            driving_limit_hours: 11.0,
            duty_window_hours: 14.0,
            break_after_driving_hours: 8.0,
            break_minutes: 30.0,
            reset_hours: 10.0,
            restart_hours: Some(34.0),
            cycle_limit_hours: 70.0,
            cycle_days: 8,
            warning_margin_minutes: 30.0,
            fuel_interval_miles: 1000.0,
            fuel_minutes: 30.0,
            pickup_hours: 1.0,
            dropoff_hours: 1.0,
        }
    }
}

impl HosRules {
    pub fn warning_margin_hours(&self) -> f64 {
        self.warning_margin_minutes / 60.0
    }

    /// Reject limits the planner cannot make progress under.
    pub fn validate(&self) -> Result<(), String> {
        let positive = [
            ("driving-limit-hours", self.driving_limit_hours),
            ("duty-window-hours", self.duty_window_hours),
            ("break-after-driving-hours", self.break_after_driving_hours),
            ("reset-hours", self.reset_hours),
            ("cycle-limit-hours", self.cycle_limit_hours),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("{name} must be positive, got {value}"));
            }
        }

        let non_negative = [
            ("break-minutes", self.break_minutes),
            ("warning-margin-minutes", self.warning_margin_minutes),
            ("fuel-interval-miles", self.fuel_interval_miles),
            ("fuel-minutes", self.fuel_minutes),
            ("pickup-hours", self.pickup_hours),
            ("dropoff-hours", self.dropoff_hours),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(format!("{name} must not be negative, got {value}"));
            }
        }

        if let Some(restart) = self.restart_hours
            && !(restart.is_finite() && restart >= self.reset_hours)
        {
            return Err(format!(
                "restart-hours must be at least reset-hours ({}), got {restart}",
                self.reset_hours
            ));
        }
        if self.cycle_days == 0 {
            return Err("cycle-days must be at least 1".to_string());
        }
        if self.pickup_hours.max(self.dropoff_hours).max(self.fuel_minutes / 60.0)
            > self.duty_window_hours
        {
            return Err("on-duty stops must fit inside the duty window".to_string());
        }
        Ok(())
    }
}

/// Everything besides the limits that shapes a trip report.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlanOptions {
    pub rules: HosRules,

    /// Status logged for `Restart` stops.
    pub restart_status: RestartStatus,

    /// Pad the first and last day with off-duty time to a full sheet.
    pub pad_partial_days: bool,

    /// Used when a trip names no time zone. `None` means UTC.
    pub default_time_zone: Option<String>,
}

/// How an overnight or restart stop is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RestartStatus {
    #[default]
    SleeperBerth,
    OffDuty,
}

impl From<RestartStatus> for DutyStatus {
    fn from(status: RestartStatus) -> Self {
        match status {
            RestartStatus::SleeperBerth => DutyStatus::SleeperBerth,
            RestartStatus::OffDuty => DutyStatus::OffDuty,
        }
    }
}
