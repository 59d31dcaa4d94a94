//! Timestamp parsing and timezone conversion.
//!
//! Raw timestamps are fixed-format UTC strings such as
//! `2025-06-02T20:05:00.000Z`. They are converted to the analysis timezone
//! using that zone's rules for the instant's own date, so a summer filing gets
//! EDT and a winter one EST.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::error::RecordError;
use crate::record::{DerivedRecord, FilingRecord};

/// Format of every timestamp in the dataset. The fraction is optional.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Format written back out when constructing the dataset.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Parses a raw UTC timestamp, failing on anything that is not exactly
/// [`TIMESTAMP_FORMAT`].
pub fn parse_utc(field: &'static str, raw: &str) -> Result<DateTime<Utc>, RecordError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(RecordError::MissingField { field });
    }

    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|source| RecordError::MalformedTimestamp {
            field,
            value: raw.to_string(),
            source,
        })
}

/// Parses the `size` column. Empty means unknown; anything else must be a
/// non-negative integer byte count.
pub fn parse_size(raw: Option<&str>) -> Result<Option<u64>, RecordError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| RecordError::MalformedField {
            field: "size",
            value: value.to_string(),
            expected: "a non-negative byte count",
        }),
    }
}

pub fn to_local(instant: DateTime<Utc>, tz: Tz) -> DateTime<Tz> {
    instant.with_timezone(&tz)
}

/// Turns raw [`FilingRecord`]s into [`DerivedRecord`]s for one timezone.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    tz: Tz,
}

impl Normalizer {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn normalize(&self, record: &FilingRecord) -> Result<DerivedRecord, RecordError> {
        let detected = parse_utc(
            "detectedTime",
            record.detected_time.as_deref().unwrap_or_default(),
        )?;
        let accepted = parse_utc(
            "acceptanceDateTime",
            record.acceptance_date_time.as_deref().unwrap_or_default(),
        )?;
        let size = parse_size(record.size.as_deref())?;

        let detected_local = to_local(detected, self.tz);
        let accepted_local = to_local(accepted, self.tz);
        let delay_seconds = (detected_local - accepted_local).num_seconds() as f64;

        Ok(DerivedRecord {
            accession_number: record.accession_number.clone(),
            submission_type: record.submission_type.clone(),
            size,
            detected_date: detected_local.date_naive(),
            acceptance_date: accepted_local.date_naive(),
            detected_time_of_day: detected_local.time(),
            acceptance_time_of_day: accepted_local.time(),
            detected_local,
            accepted_local,
            delay_seconds,
        })
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(chrono_tz::US::Eastern)
    }
}
