//! Builds the detected-time dataset from a filings export and a master
//! submissions export.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{IngestError, RecordError};
use crate::ingest::open_input;
use crate::normalize::{CANONICAL_FORMAT, TIMESTAMP_FORMAT, parse_size};
use crate::record::FilingRecord;

/// Master exports may carry timestamps without the `T`/`Z` decoration.
const MASTER_FORMATS: &[&str] = &[TIMESTAMP_FORMAT, "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectedFiling {
    accession_number: String,
    submission_type: Option<String>,
    detected_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MasterSubmission {
    accession_number: String,
    acceptance_date_time: Option<String>,
    size: Option<String>,
}

/// Formats an accession number as `CCCCCCCCCC-YY-NNNNNN`.
///
/// Accepts the dashed form, the bare 18-digit form, or a shorter integer that
/// lost its leading zeros.
pub fn format_accession(raw: &str) -> Result<String, RecordError> {
    let digits: String = raw.trim().chars().filter(|c| *c != '-').collect();
    if digits.is_empty() || digits.len() > 18 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(RecordError::MalformedAccession {
            value: raw.to_string(),
        });
    }

    let padded = format!("{digits:0>18}");
    Ok(format!("{}-{}-{}", &padded[..10], &padded[10..12], &padded[12..]))
}

/// Re-renders a UTC acceptance timestamp as `%Y-%m-%dT%H:%M:%S%.3fZ`.
pub fn canonical_timestamp(raw: &str) -> Result<String, RecordError> {
    let raw = raw.trim();
    let mut last_err = None;
    for format in MASTER_FORMATS {
        match NaiveDateTime::parse_from_str(raw, format) {
            Ok(naive) => return Ok(naive.format(CANONICAL_FORMAT).to_string()),
            Err(e) => last_err = Some(e),
        }
    }
    match last_err {
        Some(source) => Err(RecordError::MalformedTimestamp {
            field: "acceptanceDateTime",
            value: raw.to_string(),
            source,
        }),
        None => Err(RecordError::MissingField {
            field: "acceptanceDateTime",
        }),
    }
}

fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, IngestError> {
    let name = path.display().to_string();
    let mut rdr = csv::Reader::from_reader(open_input(path)?);
    rdr.deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|source| IngestError::Csv { path: name, source })
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ConstructSummary {
    pub filings_read: usize,
    pub without_detection: usize,
    pub malformed_accessions: usize,
    pub matched: usize,
    pub unmatched: usize,
}

/// Left-joins detected filings onto master submissions by accession number.
///
/// Filings without a detection time are dropped. Master rows with malformed
/// accession numbers are skipped with a warning, and unreadable acceptance
/// times or sizes are blanked; filings that find no master row keep empty
/// acceptance and size fields.
pub fn join_filings(
    filings: Vec<FilingRecord>,
    master: Vec<(String, Option<String>, Option<String>)>,
) -> (Vec<FilingRecord>, ConstructSummary) {
    let mut summary = ConstructSummary {
        filings_read: filings.len(),
        ..Default::default()
    };

    let mut by_accession: HashMap<String, (Option<String>, Option<u64>)> = HashMap::new();
    for (accession, accepted, size) in master {
        let key = match format_accession(&accession) {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "Skipping master row");
                continue;
            }
        };
        let accepted = match accepted.as_deref().map(canonical_timestamp).transpose() {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(accession = %key, error = %e, "Master acceptance time unreadable");
                None
            }
        };
        let size = match parse_size(size.as_deref()) {
            Ok(size) => size,
            Err(e) => {
                warn!(accession = %key, error = %e, "Master size unreadable");
                None
            }
        };
        by_accession.insert(key, (accepted, size));
    }

    let mut joined = Vec::with_capacity(filings.len());
    for mut filing in filings {
        if filing.detected_time.as_deref().is_none_or(|t| t.trim().is_empty()) {
            summary.without_detection += 1;
            continue;
        }

        match format_accession(&filing.accession_number) {
            Ok(dashed) => filing.accession_number = dashed,
            Err(e) => {
                warn!(error = %e, "Keeping filing with unrecognized accession number");
                summary.malformed_accessions += 1;
            }
        }

        match by_accession.get(&filing.accession_number) {
            Some((accepted, size)) => {
                filing.acceptance_date_time = accepted.clone();
                filing.size = size.map(|s| s.to_string());
                summary.matched += 1;
            }
            None => summary.unmatched += 1,
        }
        joined.push(filing);
    }

    (joined, summary)
}

/// Reads both exports, joins them, and writes the five-column dataset.
#[tracing::instrument(skip_all, fields(filings = %filings_path.display(), master = %master_path.display(), output = %output_path.display()))]
pub fn construct_dataset(
    filings_path: &Path,
    master_path: &Path,
    output_path: &Path,
) -> Result<ConstructSummary> {
    let filings: Vec<FilingRecord> = read_rows::<DetectedFiling>(filings_path)?
        .into_iter()
        .map(|f| FilingRecord {
            accession_number: f.accession_number,
            submission_type: f.submission_type,
            detected_time: f.detected_time,
            ..Default::default()
        })
        .collect();
    let master = read_rows::<MasterSubmission>(master_path)?
        .into_iter()
        .map(|m| (m.accession_number, m.acceptance_date_time, m.size))
        .collect();

    let (joined, summary) = join_filings(filings, master);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    crate::output::write_series(output_path, &joined)?;

    info!(
        filings_read = summary.filings_read,
        without_detection = summary.without_detection,
        malformed_accessions = summary.malformed_accessions,
        matched = summary.matched,
        unmatched = summary.unmatched,
        written = joined.len(),
        "Dataset constructed"
    );
    Ok(summary)
}
