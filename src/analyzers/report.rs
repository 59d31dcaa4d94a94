//! The analyses, each composed from the pipeline stages.
//!
//! Every report is a pure function of the normalized records and the
//! [`AnalysisConfig`]. Writing series and summaries to disk is left to
//! [`crate::output`].

use anyhow::Result;
use chrono::{NaiveTime, Weekday};
use serde::Serialize;
use tracing::info;

use crate::analyzers::cumulative::{CumulativePoint, cumulative_series, first_reaching};
use crate::analyzers::distribution::{
    MissingBucketPolicy, average_by_bucket, daily_bucket_shares, day_count,
};
use crate::analyzers::extremum::{Extreme, extremum_by};
use crate::analyzers::filter::RecordFilter;
use crate::analyzers::types::{
    DelayPoint, DelaySizeSummary, DetectionDelaySummary, DetectionPoint, ExtremeResult,
    ExtremeRow, ReferenceLine,
};
use crate::config::AnalysisConfig;
use crate::record::{DerivedRecord, fractional_hours};

/// Market open, market close and the regulatory cutoff as chart annotations.
pub fn reference_lines(config: &AnalysisConfig) -> Vec<ReferenceLine> {
    let line = |label: &str, time: NaiveTime| ReferenceLine {
        label: format!("{label} ({})", time.format("%H:%M")),
        hour: fractional_hours(time),
    };
    vec![
        line("Market Open", config.market_open),
        line("Market Close", config.market_close),
        line("Filing Cutoff", config.filing_cutoff),
    ]
}

#[derive(Debug, Serialize)]
pub struct ClusteringReport {
    pub record_count: usize,
    pub day_count: usize,
    pub bucket_minutes: u32,
    pub missing_buckets: MissingBucketPolicy,
    pub reference_lines: Vec<ReferenceLine>,
    pub peak_bucket: Option<NaiveTime>,
    pub peak_avg_percent: Option<f64>,
    pub half_day_bucket: Option<NaiveTime>,
    pub final_cumulative_percent: Option<f64>,
    #[serde(skip)]
    pub series: Vec<CumulativePoint>,
}

impl ClusteringReport {
    pub fn log_summary(&self) {
        info!(
            records = self.record_count,
            days = self.day_count,
            buckets = self.series.len(),
            peak_bucket = ?self.peak_bucket,
            peak_avg_percent = ?self.peak_avg_percent,
            half_day_bucket = ?self.half_day_bucket,
            final_cumulative_percent = ?self.final_cumulative_percent,
            "Acceptance time clustering"
        );
    }
}

/// Average share of each day's acceptances per time-of-day bucket, plus the
/// running total across the day.
#[tracing::instrument(skip_all, fields(records = records.len()))]
pub fn clustering(records: &[DerivedRecord], config: &AnalysisConfig) -> Result<ClusteringReport> {
    let width = config.bucket_width()?;
    let shares = daily_bucket_shares(records, width);
    let averages = average_by_bucket(&shares, config.missing_buckets);
    let series = cumulative_series(&averages);

    let peak = averages
        .iter()
        .max_by(|a, b| a.avg_percent_of_day.total_cmp(&b.avg_percent_of_day));

    Ok(ClusteringReport {
        record_count: records.len(),
        day_count: day_count(&shares),
        bucket_minutes: width.minutes(),
        missing_buckets: config.missing_buckets,
        reference_lines: reference_lines(config),
        peak_bucket: peak.map(|p| p.bucket),
        peak_avg_percent: peak.map(|p| p.avg_percent_of_day),
        half_day_bucket: first_reaching(&series, 50.0),
        final_cumulative_percent: series.last().map(|p| p.cumulative_percent),
        series,
    })
}

#[derive(Debug, Serialize)]
pub struct DelaySizeReport {
    pub all_same_day: DelaySizeSummary,
    pub market_hours: DelaySizeSummary,
    #[serde(skip)]
    pub series: Vec<DelayPoint>,
}

impl DelaySizeReport {
    pub fn log_summary(&self) {
        for (subset, s) in [("all_same_day", &self.all_same_day), ("market_hours", &self.market_hours)] {
            info!(
                subset,
                total_filings = s.total_filings,
                mean_size = ?s.size_bytes.mean,
                median_size = ?s.size_bytes.median,
                mean_delay_secs = ?s.delay_seconds.mean,
                median_delay_secs = ?s.delay_seconds.median,
                "Size vs detection delay"
            );
        }
    }
}

/// Filing size against detection delay for same-day filings with a positive
/// delay, overall and within market hours.
#[tracing::instrument(skip_all, fields(records = records.len()))]
pub fn delay_size(records: &[DerivedRecord], config: &AnalysisConfig) -> Result<DelaySizeReport> {
    let market = config.market_hours()?;
    let positive = RecordFilter::new().same_day().positive_delay().apply(records);
    let in_market = RecordFilter::new()
        .accepted_within(market)
        .apply(positive.iter().copied());

    let series = positive
        .iter()
        .map(|r| DelayPoint {
            accession_number: r.accession_number.clone(),
            submission_type: r.submission_type.clone(),
            size: r.size,
            delay_seconds: r.delay_seconds,
            market_hours: market.contains(r.acceptance_time_of_day),
        })
        .collect();

    Ok(DelaySizeReport {
        all_same_day: DelaySizeSummary::of(&positive),
        market_hours: DelaySizeSummary::of(&in_market),
        series,
    })
}

#[derive(Debug, Serialize)]
pub struct DetectionTimingReport {
    pub weekday: String,
    pub submission_type: String,
    pub reference_lines: Vec<ReferenceLine>,
    pub subset: DetectionDelaySummary,
    pub all_same_day: DetectionDelaySummary,
    #[serde(skip)]
    pub series: Vec<DetectionPoint>,
}

impl DetectionTimingReport {
    pub fn log_summary(&self) {
        for (subset, s) in [("subset", &self.subset), ("all_same_day", &self.all_same_day)] {
            info!(
                subset,
                weekday = %self.weekday,
                submission_type = %self.submission_type,
                total_filings = s.total_filings,
                mean_delay_secs = ?s.delay_seconds.mean,
                median_delay_secs = ?s.delay_seconds.median,
                mean_delay_mins = ?s.delay_minutes.mean,
                median_delay_mins = ?s.delay_minutes.median,
                "Acceptance vs detection time"
            );
        }
    }
}

/// Acceptance against detection time of day for same-day filings, with one
/// weekday/form-type subset broken out (e.g. Friday 8-Ks).
#[tracing::instrument(skip_all, fields(records = records.len(), weekday = %weekday, submission_type = %submission_type))]
pub fn detection_timing(
    records: &[DerivedRecord],
    config: &AnalysisConfig,
    weekday: Weekday,
    submission_type: &str,
) -> Result<DetectionTimingReport> {
    let same_day = RecordFilter::new().same_day().apply(records);
    let subset_filter = RecordFilter::new()
        .on_weekday(weekday)
        .with_submission_type(submission_type);
    let subset = subset_filter.apply(same_day.iter().copied());

    let series = same_day
        .iter()
        .map(|r| DetectionPoint {
            accession_number: r.accession_number.clone(),
            submission_type: r.submission_type.clone(),
            acceptance_hours: r.acceptance_hours(),
            detected_hours: r.detected_hours(),
            in_subset: subset_filter.matches(r),
        })
        .collect();

    Ok(DetectionTimingReport {
        weekday: weekday.to_string(),
        submission_type: submission_type.to_string(),
        reference_lines: reference_lines(config),
        subset: DetectionDelaySummary::of(&subset),
        all_same_day: DetectionDelaySummary::of(&same_day),
        series,
    })
}

#[derive(Debug, Serialize)]
pub struct ExtremesReport {
    pub first_after_early_cutoff: ExtremeResult,
    pub last_same_day: ExtremeResult,
    pub last_next_day: ExtremeResult,
}

impl ExtremesReport {
    pub fn log_summary(&self) {
        for result in [
            &self.first_after_early_cutoff,
            &self.last_same_day,
            &self.last_next_day,
        ] {
            match result.time_of_day {
                Some(time) => {
                    for row in &result.rows {
                        info!(
                            query = %result.query,
                            time_of_day = %time,
                            accession = %row.accession_number,
                            submission_type = ?row.submission_type,
                            accepted = %row.accepted_local,
                            detected = %row.detected_local,
                            "Extreme acceptance time"
                        );
                    }
                }
                None => info!(query = %result.query, "No filings matched"),
            }
        }
    }
}

fn extreme_result(query: String, records: &[&DerivedRecord], extreme: Extreme) -> ExtremeResult {
    match extremum_by(records, extreme, |r| r.acceptance_time_of_day) {
        Some(found) => ExtremeResult {
            query,
            time_of_day: Some(found.value),
            rows: found.rows.into_iter().map(ExtremeRow::from).collect(),
        },
        None => ExtremeResult {
            query,
            time_of_day: None,
            rows: Vec::new(),
        },
    }
}

/// Earliest acceptance after the early cutoff, and latest acceptances for
/// filings detected the same day and the next day.
#[tracing::instrument(skip_all, fields(records = records.len()))]
pub fn extremes(records: &[DerivedRecord], config: &AnalysisConfig) -> Result<ExtremesReport> {
    let after_cutoff = RecordFilter::new()
        .accepted_after(config.early_cutoff)
        .apply(records);
    let same_day = RecordFilter::new().same_day().apply(records);
    let next_day = RecordFilter::new().next_day().apply(records);

    Ok(ExtremesReport {
        first_after_early_cutoff: extreme_result(
            format!("earliest acceptance after {}", config.early_cutoff),
            &after_cutoff,
            Extreme::Min,
        ),
        last_same_day: extreme_result(
            "latest acceptance detected same day".to_string(),
            &same_day,
            Extreme::Max,
        ),
        last_next_day: extreme_result(
            "latest acceptance detected next day".to_string(),
            &next_day,
            Extreme::Max,
        ),
    })
}
