use chrono::NaiveTime;
use serde::Serialize;

use crate::analyzers::distribution::BucketAverage;
use crate::output::SeriesRow;
use crate::record::fractional_hours;

/// One point of the per-bucket and cumulative acceptance distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativePoint {
    pub bucket: NaiveTime,
    pub seconds_since_midnight: u32,
    pub hour: f64,
    pub avg_percent_of_day: f64,
    pub observed_days: usize,
    pub cumulative_percent: f64,
}

impl SeriesRow for CumulativePoint {
    const COLUMNS: &'static [&'static str] = &[
        "bucket",
        "seconds_since_midnight",
        "hour",
        "avg_percent_of_day",
        "observed_days",
        "cumulative_percent",
    ];
}

/// Running sum of bucket averages, in the order given (time of day ascending).
///
/// The final value is close to, but not exactly, 100: it is a sum of averaged
/// ratios rather than a ratio of sums.
pub fn cumulative_series(averages: &[BucketAverage]) -> Vec<CumulativePoint> {
    averages
        .iter()
        .scan(0.0, |running, avg| {
            *running += avg.avg_percent_of_day;
            Some(CumulativePoint {
                bucket: avg.bucket,
                seconds_since_midnight: avg.seconds_since_midnight,
                hour: fractional_hours(avg.bucket),
                avg_percent_of_day: avg.avg_percent_of_day,
                observed_days: avg.observed_days,
                cumulative_percent: *running,
            })
        })
        .collect()
}

/// First bucket at which the cumulative share reaches `threshold` percent.
pub fn first_reaching(series: &[CumulativePoint], threshold: f64) -> Option<NaiveTime> {
    series
        .iter()
        .find(|p| p.cumulative_percent >= threshold)
        .map(|p| p.bucket)
}
