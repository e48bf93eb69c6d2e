//! Output formatting for CLI display.

use jiff::SignedDuration;
use jiff::tz::TimeZone;

use dutylog::TripReport;
use dutylog::model::{DailyLog, DutyStatus, Severity, Violation};

const LABEL_WIDTH: usize = 22;

/// Human-readable report: one block per day, then the verdict.
pub(super) fn format_report(report: &TripReport) -> String {
    let tz = TimeZone::get(&report.time_zone).unwrap_or(TimeZone::UTC);
    let trip = &report.trip;

    let mut header = format!("Driver: {}", trip.driver_name);
    if let Some(co) = &trip.co_driver_name {
        header.push_str(&format!(" (co-driver {co})"));
    }
    header.push_str(&format!("  Truck: {}", trip.truck_number));
    if let Some(trailer) = &trip.trailer_number {
        header.push_str(&format!("  Trailer: {trailer}"));
    }

    let mut lines = vec![
        header,
        format!("Time zone: {}", report.time_zone),
        String::new(),
    ];

    for log in &report.logs {
        let t = &log.totals;
        lines.push(format!(
            "Day {}  {}  {}",
            log.day_index, log.calendar_date, log.summary
        ));
        lines.push(format!(
            "  off {:.2}  sleeper {:.2}  driving {:.2}  on duty {:.2}  miles {:.1}",
            t.off_duty, t.sleeper, t.driving, t.on_duty, log.total_miles
        ));
        for remark in &log.remarks {
            let time = remark.at.to_zoned(tz.clone()).strftime("%H:%M").to_string();
            let note = remark
                .note
                .as_ref()
                .map(|note| format!(" ({note})"))
                .unwrap_or_default();
            lines.push(format!(
                "  {time}  {:<LABEL_WIDTH$} {}{note}",
                remark.status.label(),
                remark.location
            ));
        }
        lines.extend(
            log.violations
                .iter()
                .map(|violation| format!("  {}", format_violation(violation))),
        );
        lines.push(String::new());
    }

    let s = &report.summary;
    let r = &s.remaining;
    let verdict = if s.feasible { "feasible" } else { "NOT feasible" };
    lines.extend([
        format!("Trip is {verdict}"),
        format!(
            "Distance {:.1} mi, {:.2} h total, {:.2} h driving",
            s.total_distance_miles, s.total_trip_hours, s.total_driving_hours
        ),
        format!(
            "Arrives {}",
            s.estimated_arrival.to_zoned(tz).strftime("%Y-%m-%d %H:%M %Z")
        ),
        format!(
            "Remaining: driving {:.2}  window {:.2}  until break {:.2}  cycle {:.2}",
            r.driving, r.duty_window, r.until_break, r.cycle
        ),
    ]);
    lines.join("\n")
}

pub(super) fn format_violation(violation: &Violation) -> String {
    let tag = match violation.severity {
        Severity::Warning => "warning",
        Severity::Blocking => "VIOLATION",
    };
    format!("{tag} [{}] {}", violation.rule_id.as_str(), violation.message)
}

/// The four-row duty grid for one day.
///
/// `#` marks the row's status, `.` another status, blank time outside the
/// trip.
pub(super) fn format_grid(log: &DailyLog, width: SignedDuration) -> String {
    let buckets = log.buckets(width);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let per_hour = (3600 / width.as_secs().max(1)).max(1) as usize;

    let mut lines = vec![
        format!("Day {}  {}  {}", log.day_index, log.calendar_date, log.summary),
        format!("{:LABEL_WIDTH$} {}", "", ruler(buckets.len(), per_hour)),
    ];
    for status in DutyStatus::ALL {
        let cells: String = buckets
            .iter()
            .map(|bucket| match bucket {
                Some(s) if *s == status => '#',
                Some(_) => '.',
                None => ' ',
            })
            .collect();
        lines.push(format!(
            "{:<LABEL_WIDTH$}|{cells}| {:>5.2}",
            status.label(),
            log.totals.get(status)
        ));
    }
    lines.push(format!(
        "{:<LABEL_WIDTH$} {:>w$} {:>5.2}",
        "Total",
        "",
        log.totals.sum(),
        w = buckets.len() + 1
    ));
    lines.join("\n")
}

/// Hour labels, placed where they fit. `M` and `N` mark midnight and noon.
fn ruler(columns: usize, per_hour: usize) -> String {
    let mut line = String::new();
    for hour in 0..columns.div_ceil(per_hour) {
        let column = hour * per_hour + 1;
        if line.len() > column {
            continue;
        }
        let label = match hour % 24 {
            0 => "M".to_string(),
            12 => "N".to_string(),
            h => (h % 12).to_string(),
        };
        line.extend(std::iter::repeat_n(' ', column - line.len()));
        line.push_str(&label);
        line.push(' ');
    }
    line.truncate(columns + 1);
    line.trim_end().to_string()
}
