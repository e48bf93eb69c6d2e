//! Hours-of-Service evaluation: one forward pass over the timeline.
//!
//! Four clocks are carried from interval to interval:
//!
//! - driving since the last reset (11-hour limit),
//! - on duty since the last reset (14-hour window),
//! - driving since the last 30-minute break (8-hour rule),
//! - on duty inside the trailing cycle window (70 hours in 8 days).
//!
//! A reset is a run of consecutive off-duty or sleeper time of at least
//! ten hours. It zeroes the first three clocks. The cycle clock only
//! forgets time as it ages out of the window, or all at once after a
//! 34-hour restart.
//!
//! Each rule reports at most once per accumulation period: the latch is
//! released when its clock resets. The cycle clock has no reset short of a
//! restart, so its latch is also released once the clock falls back below
//! the warning band.
//!
//! When one interval trips several rules they are reported in the order
//! driving limit, duty window, break, cycle.

use std::collections::{HashSet, VecDeque};

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::model::{
    CycleState, DutyInterval, DutyStatus, RuleId, Severity, Timeline, Violation, duration_to_hours,
    hours_to_duration,
};
use crate::partition::DayCalendar;
use crate::rules::HosRules;

/// Slack for comparing accumulated hours against a limit.
const EPSILON_HOURS: f64 = 1e-9;

/// Outcome of one evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub violations: Vec<Violation>,

    /// Cycle state at the end of the trip, ready to seed the next one.
    pub final_cycle: CycleState,

    /// False iff any violation is blocking.
    pub feasible: bool,

    pub remaining: HoursRemaining,
}

/// Hours left on each clock when the trip ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoursRemaining {
    pub driving: f64,
    pub duty_window: f64,
    pub until_break: f64,
    pub cycle: f64,
}

/// Evaluate a timeline against the rules.
///
/// `initial` is consumed: it becomes the accumulator for this pass and is
/// returned, advanced, as `final_cycle`.
pub fn evaluate(
    timeline: &Timeline,
    initial: CycleState,
    rules: &HosRules,
    calendar: &DayCalendar,
) -> Evaluation {
    let mut pass = Pass::new(timeline.start_utc(), initial, rules, calendar);
    for interval in timeline.intervals() {
        pass.step(interval);
    }
    pass.finish(timeline.end_utc())
}

/// Mutable state of a single evaluation. Never shared.
struct Pass<'a> {
    rules: &'a HosRules,
    calendar: &'a DayCalendar,
    cycle: CycleState,
    window: SignedDuration,

    driving_since_reset: f64,
    on_duty_since_reset: f64,
    driving_since_break: f64,

    /// Consecutive non-driving hours, for the break rule.
    non_driving_run: f64,
    /// Consecutive off-duty or sleeper hours, for resets.
    rest_run: f64,

    /// On-duty spans that may still fall inside the cycle window.
    ledger: VecDeque<(Timestamp, Timestamp)>,

    latched: HashSet<(RuleId, Severity)>,
    violations: Vec<Violation>,
}

impl<'a> Pass<'a> {
    fn new(
        start: Timestamp,
        cycle: CycleState,
        rules: &'a HosRules,
        calendar: &'a DayCalendar,
    ) -> Self {
        let window = SignedDuration::from_hours(i64::from(cycle.cycle_window_days) * 24);

        // Hours already used are placed immediately before the trip, so they
        // leave the window as late as they possibly could.
        let mut ledger = VecDeque::new();
        if cycle.hours_used_in_cycle > 0.0 {
            let prior = hours_to_duration(cycle.hours_used_in_cycle);
            let from = start.checked_sub(prior).unwrap_or(Timestamp::MIN);
            ledger.push_back((from, start));
        }

        Self {
            rules,
            calendar,
            cycle,
            window,
            driving_since_reset: 0.0,
            on_duty_since_reset: 0.0,
            driving_since_break: 0.0,
            non_driving_run: 0.0,
            rest_run: 0.0,
            ledger,
            latched: HashSet::new(),
            violations: Vec::new(),
        }
    }

    fn step(&mut self, interval: &DutyInterval) {
        let hours = interval.hours();

        if interval.status.is_rest() {
            self.rest_run += hours;
            self.take_non_driving(hours);
            if self.rest_run + EPSILON_HOURS >= self.rules.reset_hours {
                self.daily_reset(interval.end_utc);
            }
            if let Some(restart) = self.rules.restart_hours
                && self.rest_run + EPSILON_HOURS >= restart
            {
                self.ledger.clear();
                self.cycle.hours_used_in_cycle = 0.0;
                self.release(RuleId::CycleLimit);
            }
            return;
        }

        self.rest_run = 0.0;
        let driving = interval.status == DutyStatus::Driving;
        if driving {
            self.non_driving_run = 0.0;
            let before = self.driving_since_reset;
            self.driving_since_reset += hours;
            self.check(
                RuleId::DrivingLimit,
                interval,
                before,
                self.driving_since_reset,
                self.rules.driving_limit_hours,
            );
        } else {
            self.take_non_driving(hours);
        }

        let before = self.on_duty_since_reset;
        self.on_duty_since_reset += hours;
        self.check(
            RuleId::DutyWindow,
            interval,
            before,
            self.on_duty_since_reset,
            self.rules.duty_window_hours,
        );

        if driving {
            let before = self.driving_since_break;
            self.driving_since_break += hours;
            self.check(
                RuleId::BreakRequired,
                interval,
                before,
                self.driving_since_break,
                self.rules.break_after_driving_hours,
            );
        }

        // The cycle only re-arms once it has dropped out of the warning band.
        let before = self.cycle_hours_at(interval.start_utc);
        let band = self.cycle.cycle_window_hours - self.rules.warning_margin_hours();
        if before + EPSILON_HOURS < band {
            self.release(RuleId::CycleLimit);
        }
        self.age_ledger(interval.start_utc);
        self.ledger.push_back((interval.start_utc, interval.end_utc));
        let after = self.cycle_hours_at(interval.end_utc);
        self.cycle.hours_used_in_cycle = after;
        self.check(
            RuleId::CycleLimit,
            interval,
            before,
            after,
            self.cycle.cycle_window_hours,
        );
    }

    fn take_non_driving(&mut self, hours: f64) {
        self.non_driving_run += hours;
        if self.non_driving_run + EPSILON_HOURS >= self.rules.break_minutes / 60.0 {
            self.driving_since_break = 0.0;
            self.release(RuleId::BreakRequired);
        }
    }

    fn daily_reset(&mut self, at: Timestamp) {
        self.driving_since_reset = 0.0;
        self.on_duty_since_reset = 0.0;
        self.driving_since_break = 0.0;
        self.cycle.last_off_duty_reset = Some(at);
        self.release(RuleId::DrivingLimit);
        self.release(RuleId::DutyWindow);
        self.release(RuleId::BreakRequired);
    }

    fn release(&mut self, rule: RuleId) {
        self.latched.remove(&(rule, Severity::Warning));
        self.latched.remove(&(rule, Severity::Blocking));
    }

    /// Compare a clock that moved from `before` to `after` during `interval`.
    ///
    /// Reaching the limit exactly is allowed and silent; the warning band
    /// lies strictly below it.
    fn check(&mut self, rule: RuleId, interval: &DutyInterval, before: f64, after: f64, limit: f64) {
        if after > limit + EPSILON_HOURS {
            // Place the crossing assuming the clock ran at full rate.
            let into = hours_to_duration((limit - before).clamp(0.0, interval.hours()));
            let crossed = interval
                .start_utc
                .checked_add(into)
                .unwrap_or(interval.end_utc);
            let message = self.blocking_message(rule, limit);
            let day_index = self.calendar.day_index(crossed);
            self.report(rule, Severity::Blocking, day_index, message);
        } else if after + EPSILON_HOURS < limit
            && after + EPSILON_HOURS >= limit - self.rules.warning_margin_hours()
        {
            let message = format!(
                "approaching the {}: {after:.2} of {} hours used",
                self.rule_name(rule, limit),
                fmt_hours(limit)
            );
            let day_index = self.calendar.day_index_before(interval.end_utc);
            self.report(rule, Severity::Warning, day_index, message);
        }
    }

    fn rule_name(&self, rule: RuleId, limit: f64) -> String {
        let limit = fmt_hours(limit);
        match rule {
            RuleId::DrivingLimit => format!("{limit}-hour driving limit"),
            RuleId::DutyWindow => format!("{limit}-hour on-duty window"),
            RuleId::BreakRequired => format!("{limit}-hour driving limit before a break"),
            RuleId::CycleLimit => {
                format!("{limit}-hour/{}-day cycle limit", self.cycle.cycle_window_days)
            }
        }
    }

    fn blocking_message(&self, rule: RuleId, limit: f64) -> String {
        match rule {
            RuleId::BreakRequired => {
                format!("{}-minute break required", fmt_hours(self.rules.break_minutes))
            }
            _ => format!("{} exceeded", self.rule_name(rule, limit)),
        }
    }

    fn report(&mut self, rule: RuleId, severity: Severity, day_index: u32, message: String) {
        if !self.latched.insert((rule, severity)) {
            return;
        }
        if severity == Severity::Blocking {
            warn!(rule = rule.as_str(), day = day_index, "{message}");
        }
        self.violations.push(Violation {
            rule_id: rule,
            day_index,
            message,
            severity,
        });
    }

    fn age_ledger(&mut self, now: Timestamp) {
        let Ok(horizon) = now.checked_sub(self.window) else {
            return;
        };
        while let Some(&(_, end)) = self.ledger.front() {
            if end > horizon {
                break;
            }
            self.ledger.pop_front();
        }
    }

    /// On-duty hours inside `(at - window, at]`.
    fn cycle_hours_at(&self, at: Timestamp) -> f64 {
        let horizon = at.checked_sub(self.window).unwrap_or(Timestamp::MIN);
        self.ledger
            .iter()
            .map(|&(start, end)| {
                let from = start.max(horizon);
                let to = end.min(at);
                if to > from {
                    duration_to_hours(to.duration_since(from))
                } else {
                    0.0
                }
            })
            .sum()
    }

    fn finish(mut self, end: Timestamp) -> Evaluation {
        self.cycle.hours_used_in_cycle = self.cycle_hours_at(end);
        let rules = self.rules;
        let remaining = HoursRemaining {
            driving: (rules.driving_limit_hours - self.driving_since_reset).max(0.0),
            duty_window: (rules.duty_window_hours - self.on_duty_since_reset).max(0.0),
            until_break: (rules.break_after_driving_hours - self.driving_since_break).max(0.0),
            cycle: self.cycle.hours_available(),
        };
        let feasible = !self.violations.iter().any(Violation::is_blocking);
        info!(
            feasible,
            violations = self.violations.len(),
            cycle_hours = self.cycle.hours_used_in_cycle,
            "evaluated trip"
        );

        Evaluation {
            violations: self.violations,
            final_cycle: self.cycle,
            feasible,
            remaining,
        }
    }
}

/// Format a limit without a trailing `.0` for whole numbers.
fn fmt_hours(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}
