//! Filing rows as read from disk, and their normalized form.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::output::SeriesRow;

/// A single row of the detected-time dataset.
///
/// Timestamps and size stay as raw strings until
/// [`crate::normalize::Normalizer`] validates them, so one malformed value
/// never poisons the whole file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingRecord {
    pub accession_number: String,
    pub submission_type: Option<String>,
    pub detected_time: Option<String>,
    pub acceptance_date_time: Option<String>,
    pub size: Option<String>,

    /// Line in the source file, filled in by the reader.
    #[serde(skip)]
    pub line: u64,
}

impl SeriesRow for FilingRecord {
    const COLUMNS: &'static [&'static str] = &[
        "accessionNumber",
        "submissionType",
        "detectedTime",
        "acceptanceDateTime",
        "size",
    ];
}

/// A filing with both instants converted to the analysis timezone.
#[derive(Debug, Clone)]
pub struct DerivedRecord {
    pub accession_number: String,
    pub submission_type: Option<String>,
    pub size: Option<u64>,
    pub detected_local: DateTime<Tz>,
    pub accepted_local: DateTime<Tz>,
    pub detected_date: NaiveDate,
    pub acceptance_date: NaiveDate,
    pub detected_time_of_day: NaiveTime,
    pub acceptance_time_of_day: NaiveTime,
    /// `detected_local - accepted_local` in whole seconds, truncated toward zero.
    pub delay_seconds: f64,
}

impl DerivedRecord {
    /// Detection and acceptance fall on the same local calendar date.
    pub fn is_same_day(&self) -> bool {
        self.detected_date == self.acceptance_date
    }

    /// Detected on a later local calendar date than it was accepted.
    pub fn is_next_day(&self) -> bool {
        self.detected_date > self.acceptance_date
    }

    pub fn acceptance_weekday(&self) -> Weekday {
        self.accepted_local.weekday()
    }

    pub fn acceptance_hours(&self) -> f64 {
        fractional_hours(self.acceptance_time_of_day)
    }

    pub fn detected_hours(&self) -> f64 {
        fractional_hours(self.detected_time_of_day)
    }
}

/// Time of day as hours since midnight, e.g. 09:30 -> 9.5.
pub fn fractional_hours(time: NaiveTime) -> f64 {
    let seconds = time.num_seconds_from_midnight() as f64 + time.nanosecond() as f64 / 1e9;
    seconds / 3600.0
}
