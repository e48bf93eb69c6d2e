//! Day partitioning: cut the timeline at local midnight.
//!
//! Calendar days are taken in one time zone fixed for the whole trip. An
//! interval that crosses midnight is split in two with its status and
//! location carried over. Distance is apportioned linearly by elapsed time,
//! which is the only numeric approximation in the pipeline: the odometer at
//! the split is an estimate, not a reading.

use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::{SignedDuration, Timestamp};
use tracing::debug;

use crate::model::{DailyLog, DutyInterval, DutyStatus, HourTotals, Remark, Timeline};
use crate::timeline::ScheduleError;

/// Note carried by off-duty padding outside the trip.
pub const PADDING_NOTE: &str = "not on trip";

/// Maps instants to 1-based day indices in the trip's time zone.
#[derive(Debug, Clone)]
pub struct DayCalendar {
    tz: TimeZone,
    first_date: Date,
}

impl DayCalendar {
    pub fn new(tz: TimeZone, trip_start: Timestamp) -> Self {
        let first_date = trip_start.to_zoned(tz.clone()).date();
        Self { tz, first_date }
    }

    pub fn date_of(&self, at: Timestamp) -> Date {
        at.to_zoned(self.tz.clone()).date()
    }

    /// Day index of `at`; instants before the trip's first day map to 1.
    pub fn day_index(&self, at: Timestamp) -> u32 {
        let days = self
            .first_date
            .until(self.date_of(at))
            .map_or(0, |span| span.get_days());
        u32::try_from(days).unwrap_or(0) + 1
    }

    /// Day index of the last instant covered by a span ending at `end`.
    ///
    /// Interval ends are exclusive, so a span ending at local midnight
    /// belongs to the day before it.
    pub fn day_index_before(&self, end: Timestamp) -> u32 {
        let last = end
            .checked_sub(SignedDuration::from_nanos(1))
            .unwrap_or(end);
        self.day_index(last)
    }

        /// Local midnights bounding `date`.
    pub fn bounds(&self, date: Date) -> Result<(Timestamp, Timestamp), ScheduleError> {
        let start = date.to_zoned(self.tz.clone())?.timestamp();
        let end = date.tomorrow()?.to_zoned(self.tz.clone())?.timestamp();
        Ok((start, end))
    }
}

/// Split the timeline into one log shell per calendar day.
///
/// Days are dense from the first to the last day the trip touches. Totals
/// are left at zero for the grid renderer. With `pad_partial_days`, the
/// first and last day are filled out to midnight with off-duty time.
pub fn partition(
    timeline: &Timeline,
    calendar: &DayCalendar,
    pad_partial_days: bool,
) -> Result<Vec<DailyLog>, ScheduleError> {
    if timeline.is_empty() {
        return idle_day(timeline, calendar).map(|log| vec![log]);
    }

    let mut logs = Vec::new();
    let mut date = calendar.date_of(timeline.start_utc());
    let (mut day_start, mut day_end) = calendar.bounds(date)?;
    let mut day: Vec<DutyInterval> = Vec::new();

    for interval in timeline.intervals() {
        let mut piece = interval.clone();
        loop {
            while piece.start_utc >= day_end {
                let closed = shell(&logs, date, day_start, day_end, std::mem::take(&mut day));
                logs.push(closed);
                date = date.tomorrow()?;
                (day_start, day_end) = calendar.bounds(date)?;
            }
            if piece.end_utc <= day_end {
                day.push(piece);
                break;
            }
            let (head, tail) = split_at(piece, day_end);
            day.push(head);
            piece = tail;
        }
    }
    let closed = shell(&logs, date, day_start, day_end, day);
    logs.push(closed);

    if pad_partial_days {
        pad(&mut logs);
    }
    annotate(&mut logs);

    debug!(days = logs.len(), "partitioned timeline");
    Ok(logs)
}

fn shell(
    logs: &[DailyLog],
    calendar_date: Date,
    day_start_utc: Timestamp,
    day_end_utc: Timestamp,
    intervals: Vec<DutyInterval>,
) -> DailyLog {
    DailyLog {
        day_index: u32::try_from(logs.len() + 1).unwrap_or(u32::MAX),
        calendar_date,
        day_start_utc,
        day_end_utc,
        intervals,
        totals: HourTotals::default(),
        total_miles: 0.0,
        remarks: Vec::new(),
        summary: String::new(),
        violations: Vec::new(),
    }
}

/// A trip with no activity still gets one full off-duty sheet.
fn idle_day(timeline: &Timeline, calendar: &DayCalendar) -> Result<DailyLog, ScheduleError> {
    let date = calendar.date_of(timeline.start_utc());
    let (start, end) = calendar.bounds(date)?;
    let mut logs = vec![shell(
        &[],
        date,
        start,
        end,
        vec![DutyInterval {
            status: DutyStatus::OffDuty,
            start_utc: start,
            end_utc: end,
            location_label: String::new(),
            odometer_miles: timeline.start_odometer_miles(),
            distance_miles: 0.0,
            note: Some(PADDING_NOTE.to_string()),
        }],
    )];
    annotate(&mut logs);
    Ok(logs.remove(0))
}

/// Split `interval` at `at`, apportioning distance by elapsed time.
fn split_at(interval: DutyInterval, at: Timestamp) -> (DutyInterval, DutyInterval) {
    let total = interval.duration().as_secs_f64();
    let elapsed = at.duration_since(interval.start_utc).as_secs_f64();
    let head_miles = interval.distance_miles * (elapsed / total);

    let tail = DutyInterval {
        start_utc: at,
        odometer_miles: interval.odometer_miles + head_miles,
        distance_miles: interval.distance_miles - head_miles,
        ..interval.clone()
    };
    let head = DutyInterval {
        end_utc: at,
        distance_miles: head_miles,
        ..interval
    };
    (head, tail)
}

fn pad(logs: &mut [DailyLog]) {
    if let Some(first) = logs.first_mut()
        && let Some(lead) = first.intervals.first()
        && lead.start_utc > first.day_start_utc
    {
        let filler = off_duty(first.day_start_utc, lead.start_utc, lead);
        first.intervals.insert(0, filler);
    }
    if let Some(last) = logs.last_mut()
        && let Some(tail) = last.intervals.last()
        && tail.end_utc < last.day_end_utc
    {
        let filler = DutyInterval {
            odometer_miles: tail.end_odometer_miles(),
            ..off_duty(tail.end_utc, last.day_end_utc, tail)
        };
        last.intervals.push(filler);
    }
}

fn off_duty(start_utc: Timestamp, end_utc: Timestamp, near: &DutyInterval) -> DutyInterval {
    DutyInterval {
        status: DutyStatus::OffDuty,
        start_utc,
        end_utc,
        location_label: near.location_label.clone(),
        odometer_miles: near.odometer_miles,
        distance_miles: 0.0,
        note: Some(PADDING_NOTE.to_string()),
    }
}

/// Fill in miles, remarks, and the summary line.
///
/// A remark marks each status change; a midnight continuation is not a
/// change.
fn annotate(logs: &mut [DailyLog]) {
    let mut previous: Option<DutyStatus> = None;
    for log in logs.iter_mut() {
        log.total_miles = log.intervals.iter().map(|i| i.distance_miles).sum();
        log.remarks = log
            .intervals
            .iter()
            .filter(|i| {
                let changed = previous != Some(i.status);
                previous = Some(i.status);
                changed
            })
            .map(|i| Remark {
                at: i.start_utc,
                status: i.status,
                location: i.location_label.clone(),
                note: i.note.clone(),
            })
            .collect();

        let from = log.intervals.first().map_or("", |i| i.location_label.as_str());
        let to = log.intervals.last().map_or("", |i| i.location_label.as_str());
        log.summary = match (from, to) {
            ("", "") => format!("Trip Day {}", log.day_index),
            (from, to) if from == to => format!("Trip Day {}: {from}", log.day_index),
            (from, to) => format!("Trip Day {}: {from} → {to}", log.day_index),
        };
    }
}
