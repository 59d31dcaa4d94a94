//! Reads the filing dataset and normalizes every row.
//!
//! Validation happens here and only here: downstream stages receive
//! [`DerivedRecord`]s that are known to be well formed.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::MultiGzDecoder;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::IngestError;
use crate::normalize::Normalizer;
use crate::record::{DerivedRecord, FilingRecord};

/// What to do with a row whose timestamps or size cannot be normalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorMode {
    /// Drop the row, log it, and keep going.
    #[default]
    Skip,
    /// Abort the run on the first bad row.
    Strict,
}

/// A row dropped during normalization.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedRecord {
    pub line: u64,
    pub accession_number: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct Ingested {
    pub rows_read: usize,
    pub records: Vec<DerivedRecord>,
    pub rejected: Vec<RejectedRecord>,
}

/// Opens `path` for reading, transparently decompressing `.gz` files.
pub fn open_input(path: &Path) -> Result<Box<dyn Read>, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Open {
        path: path.display().to_string(),
        source,
    })?;

    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        Ok(Box::new(MultiGzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Reads every row of a filing CSV, tagging each with its source line.
pub fn read_filings(path: &Path) -> Result<Vec<FilingRecord>, IngestError> {
    let reader = open_input(path)?;
    read_filings_from(reader, &path.display().to_string())
}

pub fn read_filings_from<R: Read>(reader: R, name: &str) -> Result<Vec<FilingRecord>, IngestError> {
    let csv_err = |source: csv::Error| IngestError::Csv {
        path: name.to_string(),
        source,
    };

    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers().map_err(csv_err)?.clone();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let raw = result.map_err(csv_err)?;
        let mut row: FilingRecord = raw.deserialize(Some(&headers)).map_err(csv_err)?;
        row.line = raw.position().map(|p| p.line()).unwrap_or_default();
        rows.push(row);
    }

    debug!(source = name, rows = rows.len(), "Filing CSV read");
    Ok(rows)
}

/// Normalizes raw rows, applying `mode` uniformly to every bad row.
pub fn normalize_all(
    rows: Vec<FilingRecord>,
    normalizer: &Normalizer,
    mode: ErrorMode,
) -> Result<Ingested, IngestError> {
    let mut ingested = Ingested {
        rows_read: rows.len(),
        ..Default::default()
    };

    for row in rows {
        match normalizer.normalize(&row) {
            Ok(record) => ingested.records.push(record),
            Err(source) => {
                if mode == ErrorMode::Strict {
                    return Err(IngestError::Record {
                        line: row.line,
                        accession: row.accession_number,
                        source,
                    });
                }
                warn!(
                    line = row.line,
                    accession = %row.accession_number,
                    reason = %source,
                    "Skipping record"
                );
                ingested.rejected.push(RejectedRecord {
                    line: row.line,
                    accession_number: row.accession_number,
                    reason: source.to_string(),
                });
            }
        }
    }

    info!(
        rows_read = ingested.rows_read,
        normalized = ingested.records.len(),
        rejected = ingested.rejected.len(),
        timezone = %normalizer.timezone(),
        "Ingestion complete"
    );
    Ok(ingested)
}

/// Reads and normalizes a filing CSV in one step.
#[tracing::instrument(skip_all, fields(path = %path.display(), mode = ?mode))]
pub fn load(path: &Path, normalizer: &Normalizer, mode: ErrorMode) -> Result<Ingested, IngestError> {
    let rows = read_filings(path)?;
    normalize_all(rows, normalizer, mode)
}
