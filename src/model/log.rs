//! Daily log types: one ELD sheet per calendar day.

use jiff::civil::Date;
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize, Serializer};

use super::duty::{DutyInterval, DutyStatus};
use super::violation::Violation;

/// The record of one calendar day of a trip.
///
/// Produced as a shell by the day partitioner; the grid renderer fills in
/// `totals` and the report attaches `violations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    /// Starts at 1, dense and chronological.
    pub day_index: u32,

    pub calendar_date: Date,

    /// Local midnight that opens the day.
    pub day_start_utc: Timestamp,

    /// Local midnight that closes the day. 23 or 25 hours after the start on
    /// DST transition days.
    pub day_end_utc: Timestamp,

    /// Intervals clipped to this day, contiguous and ordered.
    pub intervals: Vec<DutyInterval>,

    #[serde(default)]
    pub totals: HourTotals,

    #[serde(default)]
    pub total_miles: f64,

    /// One entry per duty-status change during the day.
    #[serde(default)]
    pub remarks: Vec<Remark>,

    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub violations: Vec<Violation>,
}

impl DailyLog {
    pub fn day_length(&self) -> SignedDuration {
        self.day_end_utc.duration_since(self.day_start_utc)
    }

    /// Time the trip actually covers on this day.
    pub fn covered(&self) -> SignedDuration {
        match (self.intervals.first(), self.intervals.last()) {
            (Some(first), Some(last)) => last.end_utc.duration_since(first.start_utc),
            _ => SignedDuration::ZERO,
        }
    }

    /// Lazily walk the day as `(status, start, end)` fractions of the day.
    ///
    /// Calling this again restarts from midnight; nothing is cached.
    pub fn segments(&self) -> Segments<'_> {
        Segments {
            day_start: self.day_start_utc,
            day_secs: self.day_length().as_secs_f64(),
            intervals: self.intervals.iter(),
        }
    }

    /// Resample the day into buckets of `width`, the last one possibly short.
    ///
    /// Each bucket takes the status that occupies most of it, ties going to
    /// the upper grid row. Buckets the trip does not touch are `None`.
    pub fn buckets(&self, width: SignedDuration) -> Vec<Option<DutyStatus>> {
        let day_secs = self.day_length().as_secs_f64();
        let width_secs = width.as_secs_f64();
        if width_secs <= 0.0 || day_secs <= 0.0 {
            return Vec::new();
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let count = (day_secs / width_secs).ceil() as usize;
        let offset = |t: Timestamp| t.duration_since(self.day_start_utc).as_secs_f64();

        (0..count)
            .map(|n| {
                #[allow(clippy::cast_precision_loss)]
                let lo = n as f64 * width_secs;
                let hi = (lo + width_secs).min(day_secs);

                let mut occupancy = [0.0_f64; 4];
                for interval in &self.intervals {
                    let overlap = offset(interval.end_utc).min(hi) - offset(interval.start_utc).max(lo);
                    if overlap > 0.0 {
                        occupancy[row(interval.status)] += overlap;
                    }
                }

                let mut best: Option<(DutyStatus, f64)> = None;
                for status in DutyStatus::ALL {
                    let share = occupancy[row(status)];
                    if share > 0.0 && best.is_none_or(|(_, b)| share > b) {
                        best = Some((status, share));
                    }
                }
                best.map(|(status, _)| status)
            })
            .collect()
    }
}

fn row(status: DutyStatus) -> usize {
    match status {
        DutyStatus::OffDuty => 0,
        DutyStatus::SleeperBerth => 1,
        DutyStatus::Driving => 2,
        DutyStatus::OnDutyNotDriving => 3,
    }
}

/// One stretch of the day's grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSegment {
    pub status: DutyStatus,
    pub start_fraction: f64,
    pub end_fraction: f64,
}

/// Iterator returned by [`DailyLog::segments`].
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    day_start: Timestamp,
    day_secs: f64,
    intervals: std::slice::Iter<'a, DutyInterval>,
}

impl Iterator for Segments<'_> {
    type Item = GridSegment;

    fn next(&mut self) -> Option<Self::Item> {
        let interval = self.intervals.next()?;
        let fraction = |t: Timestamp| t.duration_since(self.day_start).as_secs_f64() / self.day_secs;
        Some(GridSegment {
            status: interval.status,
            start_fraction: fraction(interval.start_utc),
            end_fraction: fraction(interval.end_utc),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.intervals.size_hint()
    }
}

impl ExactSizeIterator for Segments<'_> {}

/// Hours per duty status.
///
/// Accumulated at full precision; rounded to two decimals only when
/// serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourTotals {
    #[serde(serialize_with = "round_hours")]
    pub driving: f64,
    #[serde(serialize_with = "round_hours")]
    pub on_duty: f64,
    #[serde(serialize_with = "round_hours")]
    pub sleeper: f64,
    #[serde(serialize_with = "round_hours")]
    pub off_duty: f64,
}

impl HourTotals {
    pub fn add(&mut self, status: DutyStatus, hours: f64) {
        *self.slot(status) += hours;
    }

    pub fn get(&self, status: DutyStatus) -> f64 {
        match status {
            DutyStatus::Driving => self.driving,
            DutyStatus::OnDutyNotDriving => self.on_duty,
            DutyStatus::SleeperBerth => self.sleeper,
            DutyStatus::OffDuty => self.off_duty,
        }
    }

    pub fn sum(&self) -> f64 {
        self.driving + self.on_duty + self.sleeper + self.off_duty
    }

    fn slot(&mut self, status: DutyStatus) -> &mut f64 {
        match status {
            DutyStatus::Driving => &mut self.driving,
            DutyStatus::OnDutyNotDriving => &mut self.on_duty,
            DutyStatus::SleeperBerth => &mut self.sleeper,
            DutyStatus::OffDuty => &mut self.off_duty,
        }
    }
}

pub(crate) fn round2(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

#[allow(clippy::trivially_copy_pass_by_ref)] // Signature fixed by serde.
fn round_hours<S: Serializer>(hours: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round2(*hours))
}

/// A duty-status change, with the location the regulations require.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Remark {
    pub at: Timestamp,
    pub status: DutyStatus,
    pub location: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::date;

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn interval(status: DutyStatus, start: &str, end: &str) -> DutyInterval {
        DutyInterval {
            status,
            start_utc: ts(start),
            end_utc: ts(end),
            location_label: "Joliet, IL".into(),
            odometer_miles: 0.0,
            distance_miles: 0.0,
            note: None,
        }
    }

    fn sample_day() -> DailyLog {
        DailyLog {
            day_index: 1,
            calendar_date: date(2025, 3, 3),
            day_start_utc: ts("2025-03-03T00:00:00Z"),
            day_end_utc: ts("2025-03-04T00:00:00Z"),
            intervals: vec![
                interval(
                    DutyStatus::OffDuty,
                    "2025-03-03T00:00:00Z",
                    "2025-03-03T06:00:00Z",
                ),
                interval(
                    DutyStatus::OnDutyNotDriving,
                    "2025-03-03T06:00:00Z",
                    "2025-03-03T06:45:00Z",
                ),
                interval(
                    DutyStatus::Driving,
                    "2025-03-03T06:45:00Z",
                    "2025-03-03T12:00:00Z",
                ),
            ],
            totals: HourTotals::default(),
            total_miles: 0.0,
            remarks: vec![],
            summary: String::new(),
            violations: vec![],
        }
    }

    #[test]
    fn segments_are_fractions_of_the_day() {
        let day = sample_day();
        let segments: Vec<_> = day.segments().collect();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].start_fraction, 0.0);
        assert_eq!(segments[0].end_fraction, 0.25);
        assert_eq!(segments[2].status, DutyStatus::Driving);
        assert_eq!(segments[2].end_fraction, 0.5);
    }

    #[test]
    fn segments_restart_from_midnight() {
        let day = sample_day();
        let first: Vec<_> = day.segments().collect();
        let second: Vec<_> = day.segments().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn hourly_buckets_take_the_majority_status() {
        let day = sample_day();
        let buckets = day.buckets(SignedDuration::from_hours(1));
        assert_eq!(buckets.len(), 24);
        assert_eq!(buckets[0], Some(DutyStatus::OffDuty));
        // 06:00-07:00 is 45 minutes on duty, 15 minutes driving.
        assert_eq!(buckets[6], Some(DutyStatus::OnDutyNotDriving));
        assert_eq!(buckets[11], Some(DutyStatus::Driving));
        assert_eq!(buckets[12], None);
    }

    #[test]
    fn finer_buckets_resolve_the_same_segments() {
        let day = sample_day();
        let buckets = day.buckets(SignedDuration::from_mins(15));
        assert_eq!(buckets.len(), 96);
        assert_eq!(buckets[26], Some(DutyStatus::OnDutyNotDriving));
        assert_eq!(buckets[27], Some(DutyStatus::Driving));
    }

    #[test]
    fn totals_serialize_rounded() {
        let mut totals = HourTotals::default();
        totals.add(DutyStatus::Driving, 10.0 / 3.0);
        let json = serde_json::to_value(totals).unwrap();
        assert_eq!(json["driving"], 3.33);
        assert!((totals.driving - 10.0 / 3.0).abs() < 1e-12);
    }
}
