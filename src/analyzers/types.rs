//! Serializable summary and series row types produced by the reports.

use chrono::NaiveTime;
use serde::Serialize;

use crate::analyzers::utility::{mean, median};
use crate::output::SeriesRow;
use crate::record::DerivedRecord;

/// Count, mean and median of a series. Mean and median are `None` when empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

impl Summary {
    pub fn of(values: &[f64]) -> Self {
        Summary {
            count: values.len(),
            mean: mean(values),
            median: median(values),
        }
    }

    /// Re-expresses the summary in larger units, e.g. `in_units(60.0)` for
    /// seconds to minutes.
    pub fn in_units(&self, unit: f64) -> Self {
        Summary {
            count: self.count,
            mean: self.mean.map(|v| v / unit),
            median: self.median.map(|v| v / unit),
        }
    }
}

/// A vertical annotation for time-of-day charts, in fractional hours.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub label: String,
    pub hour: f64,
}

/// Size and delay statistics for one subset of same-day filings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelaySizeSummary {
    pub total_filings: usize,
    pub size_bytes: Summary,
    pub delay_seconds: Summary,
}

impl DelaySizeSummary {
    pub fn of(records: &[&DerivedRecord]) -> Self {
        let sizes: Vec<f64> = records.iter().filter_map(|r| r.size).map(|s| s as f64).collect();
        let delays: Vec<f64> = records.iter().map(|r| r.delay_seconds).collect();
        DelaySizeSummary {
            total_filings: records.len(),
            size_bytes: Summary::of(&sizes),
            delay_seconds: Summary::of(&delays),
        }
    }
}

/// Detection delay for one subset, in seconds and minutes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionDelaySummary {
    pub total_filings: usize,
    pub delay_seconds: Summary,
    pub delay_minutes: Summary,
}

impl DetectionDelaySummary {
    pub fn of(records: &[&DerivedRecord]) -> Self {
        let delays: Vec<f64> = records.iter().map(|r| r.delay_seconds).collect();
        let seconds = Summary::of(&delays);
        DetectionDelaySummary {
            total_filings: records.len(),
            delay_minutes: seconds.in_units(60.0),
            delay_seconds: seconds,
        }
    }
}

/// Size vs. delay scatter row.
#[derive(Debug, Clone, Serialize)]
pub struct DelayPoint {
    pub accession_number: String,
    pub submission_type: Option<String>,
    pub size: Option<u64>,
    pub delay_seconds: f64,
    pub market_hours: bool,
}

impl SeriesRow for DelayPoint {
    const COLUMNS: &'static [&'static str] = &[
        "accession_number",
        "submission_type",
        "size",
        "delay_seconds",
        "market_hours",
    ];
}

/// Acceptance vs. detection time-of-day scatter row.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionPoint {
    pub accession_number: String,
    pub submission_type: Option<String>,
    pub acceptance_hours: f64,
    pub detected_hours: f64,
    pub in_subset: bool,
}

impl SeriesRow for DetectionPoint {
    const COLUMNS: &'static [&'static str] = &[
        "accession_number",
        "submission_type",
        "acceptance_hours",
        "detected_hours",
        "in_subset",
    ];
}

/// A filing attaining an extreme acceptance time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtremeRow {
    pub accession_number: String,
    pub submission_type: Option<String>,
    pub accepted_local: String,
    pub detected_local: String,
    pub delay_seconds: f64,
}

impl From<&DerivedRecord> for ExtremeRow {
    fn from(r: &DerivedRecord) -> Self {
        ExtremeRow {
            accession_number: r.accession_number.clone(),
            submission_type: r.submission_type.clone(),
            accepted_local: r.accepted_local.to_rfc3339(),
            detected_local: r.detected_local.to_rfc3339(),
            delay_seconds: r.delay_seconds,
        }
    }
}

/// Result of one extremum query. `time_of_day` is `None` when no filing matched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtremeResult {
    pub query: String,
    pub time_of_day: Option<NaiveTime>,
    pub rows: Vec<ExtremeRow>,
}
