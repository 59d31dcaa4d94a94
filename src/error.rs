//! Typed errors for ingestion, normalization, and configuration.

use thiserror::Error;

/// A single filing row that cannot be normalized.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{field} is missing")]
    MissingField { field: &'static str },

    #[error("{field} value {value:?} is not a valid UTC timestamp: {source}")]
    MalformedTimestamp {
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("{field} value {value:?} is not {expected}")]
    MalformedField {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("accession number {value:?} is not 18 digits")]
    MalformedAccession { value: String },
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("record {accession} (line {line}): {source}")]
    Record {
        line: u64,
        accession: String,
        #[source]
        source: RecordError,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown timezone {0:?}")]
    UnknownTimezone(String),

    #[error("bucket width of {0} minutes does not evenly divide an hour")]
    InvalidBucketWidth(u32),

    #[error("time window start {start} is not before end {end}")]
    InvalidWindow {
        start: chrono::NaiveTime,
        end: chrono::NaiveTime,
    },
}
