//! Output persistence for report series and summaries.
//!
//! Series are written as CSV for a chart renderer to consume; summaries are
//! written as pretty-printed JSON.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::ingest::RejectedRecord;

use csv::WriterBuilder;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty<T: std::fmt::Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// A row type that can be written as a CSV series.
///
/// `COLUMNS` must match the serialized field names; it is only used for the
/// header of an empty series, which has no row to derive one from.
pub trait SeriesRow: Serialize {
    const COLUMNS: &'static [&'static str];
}

/// Writes `rows` to a CSV file at `path`, replacing any existing file.
///
/// The header line is always written, even when `rows` is empty.
pub fn write_series<T: SeriesRow>(path: &Path, rows: &[T]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing CSV series");

    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    if rows.is_empty() {
        writer.write_record(T::COLUMNS)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes `value` as pretty-printed JSON to `path`.
pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    debug!(path = %path.display(), "Writing JSON summary");
    let body = serde_json::to_string_pretty(value)?;
    std::fs::write(path, body)?;
    Ok(())
}

/// Writes a report's series as `<name>.csv` and its summary as
/// `<name>.json` under `dir`, creating `dir` if needed.
pub fn write_report<T: SeriesRow>(
    dir: &Path,
    name: &str,
    summary: &impl Serialize,
    series: &[T],
) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)?;

    let csv_path = dir.join(format!("{name}.csv"));
    let json_path = dir.join(format!("{name}.json"));
    write_series(&csv_path, series)?;
    write_json(&json_path, summary)?;

    info!(
        csv = %csv_path.display(),
        json = %json_path.display(),
        rows = series.len(),
        "Report written"
    );
    Ok((csv_path, json_path))
}

/// File under the output directory listing the rows dropped during ingestion.
pub const REJECTED_FILE: &str = "rejected_records.json";

/// Replaces [`REJECTED_FILE`] in `dir` with this run's rejections.
///
/// With nothing rejected, a file left by an earlier run is removed instead.
/// Returns the path written, if any.
pub fn write_rejected(dir: &Path, rejected: &[RejectedRecord]) -> Result<Option<PathBuf>> {
    let path = dir.join(REJECTED_FILE);

    if rejected.is_empty() {
        match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "Removed stale rejected records"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        return Ok(None);
    }

    std::fs::create_dir_all(dir)?;
    write_json(&path, &rejected)?;
    info!(path = %path.display(), rejected = rejected.len(), "Rejected records written");
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::cumulative::CumulativePoint;
    use crate::analyzers::types::{DelayPoint, DetectionPoint};
    use crate::record::FilingRecord;
    use chrono::NaiveTime;
    use std::env;
    use std::fs;

    #[derive(Debug, Serialize)]
    struct Row {
        bucket: &'static str,
        value: f64,
    }

    impl SeriesRow for Row {
        const COLUMNS: &'static [&'static str] = &["bucket", "value"];
    }

    fn derived_header<T: SeriesRow>(row: T) -> String {
        let mut buf = Vec::new();
        {
            let mut writer = WriterBuilder::new().has_headers(true).from_writer(&mut buf);
            writer.serialize(row).unwrap();
            writer.flush().unwrap();
        }
        String::from_utf8(buf).unwrap().lines().next().unwrap().to_string()
    }

    #[test]
    fn test_columns_match_serialized_fields() {
        let point = CumulativePoint {
            bucket: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            seconds_since_midnight: 34_200,
            hour: 9.5,
            avg_percent_of_day: 10.0,
            observed_days: 1,
            cumulative_percent: 10.0,
        };
        assert_eq!(derived_header(point), CumulativePoint::COLUMNS.join(","));

        let delay = DelayPoint {
            accession_number: "a".to_string(),
            submission_type: None,
            size: None,
            delay_seconds: 1.0,
            market_hours: true,
        };
        assert_eq!(derived_header(delay), DelayPoint::COLUMNS.join(","));

        let detection = DetectionPoint {
            accession_number: "a".to_string(),
            submission_type: None,
            acceptance_hours: 9.5,
            detected_hours: 9.6,
            in_subset: false,
        };
        assert_eq!(derived_header(detection), DetectionPoint::COLUMNS.join(","));

        assert_eq!(
            derived_header(FilingRecord::default()),
            FilingRecord::COLUMNS.join(",")
        );
    }

    #[test]
    fn test_empty_series_still_has_header() {
        let dir = temp_dir("filing_timing_test_empty_series");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("empty.csv");

        write_series::<DelayPoint>(&path, &[]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content.lines().collect::<Vec<_>>(),
            vec!["accession_number,submission_type,size,delay_seconds,market_hours"]
        );

        fs::remove_dir_all(&dir).unwrap();
    }

    fn temp_dir(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    #[test]
    fn test_print_pretty_does_not_panic() {
        print_pretty(&vec![1, 2, 3]);
    }

    #[test]
    fn test_write_series_overwrites() {
        let dir = temp_dir("filing_timing_test_series");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("series.csv");

        let rows = [
            Row { bucket: "09:30:00", value: 1.5 },
            Row { bucket: "09:35:00", value: 2.0 },
        ];
        write_series(&path, &rows).unwrap();
        write_series(&path, &rows[..1]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines, vec!["bucket,value", "09:30:00,1.5"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_rejected_replaces_stale_file() {
        let dir = temp_dir("filing_timing_test_rejected");
        let _ = fs::remove_dir_all(&dir);

        let rejected = [RejectedRecord {
            line: 3,
            accession_number: "0000000001-25-000002".to_string(),
            reason: "detectedTime is missing".to_string(),
        }];
        let path = write_rejected(&dir, &rejected).unwrap().unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json[0]["line"], 3);

        // A clean run leaves no stale file behind, and tolerates its absence.
        assert!(write_rejected(&dir, &[]).unwrap().is_none());
        assert!(!path.exists());
        assert!(write_rejected(&dir, &[]).unwrap().is_none());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_report_creates_both_files() {
        let dir = temp_dir("filing_timing_test_report");
        let _ = fs::remove_dir_all(&dir);

        let rows = [Row { bucket: "16:00:00", value: 3.0 }];
        let (csv_path, json_path) =
            write_report(&dir, "clustering", &serde_json::json!({"days": 2}), &rows).unwrap();

        assert!(csv_path.exists());
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["days"], 2);

        fs::remove_dir_all(&dir).unwrap();
    }
}
