//! Violation types: regulatory findings, not errors.

use serde::{Deserialize, Serialize};

/// Which Hours-of-Service rule a finding belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleId {
    /// 11 hours of driving after a 10-hour reset.
    DrivingLimit,

    /// 14 hours on duty after a 10-hour reset.
    DutyWindow,

    /// 30-minute break after 8 hours of driving.
    BreakRequired,

    /// 70 hours on duty in 8 days.
    CycleLimit,
}

impl RuleId {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DrivingLimit => "driving-limit",
            Self::DutyWindow => "duty-window",
            Self::BreakRequired => "break-required",
            Self::CycleLimit => "cycle-limit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    /// Close to a limit. Informational.
    Warning,

    /// A limit was exceeded; the trip is not feasible as planned.
    Blocking,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub rule_id: RuleId,

    /// Day on which the threshold was crossed, starting at 1.
    pub day_index: u32,

    pub message: String,

    pub severity: Severity,
}

impl Violation {
    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Blocking
    }
}
