//! Daily-normalized distribution of acceptances over time-of-day buckets.
//!
//! Each day is normalized to 100% on its own, then the per-bucket shares are
//! averaged across days. Busy days therefore carry the same weight as quiet
//! ones.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::analyzers::utility::pct;
use crate::bucket::BucketWidth;
use crate::record::DerivedRecord;

/// How a bucket with no filings on a given day enters that bucket's average.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingBucketPolicy {
    /// Average only over the days on which the bucket was observed.
    #[default]
    Omit,
    /// Count the day as a 0% contribution.
    ZeroFill,
}

/// Filings in one bucket of one day, relative to that day's total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketShare {
    pub date: NaiveDate,
    pub bucket: NaiveTime,
    pub filing_count: usize,
    pub daily_total: usize,
    pub percent_of_day: f64,
}

/// Average share of a day's filings that land in one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketAverage {
    pub bucket: NaiveTime,
    pub seconds_since_midnight: u32,
    pub avg_percent_of_day: f64,
    /// Days on which this bucket had at least one filing.
    pub observed_days: usize,
}

/// Groups records by `(acceptance date, bucket)` and by acceptance date,
/// joining the two so every row carries its day's total.
///
/// Rows come out ordered by date, then bucket.
pub fn daily_bucket_shares(records: &[DerivedRecord], width: BucketWidth) -> Vec<BucketShare> {
    let mut counts: BTreeMap<(NaiveDate, NaiveTime), usize> = BTreeMap::new();
    let mut totals: BTreeMap<NaiveDate, usize> = BTreeMap::new();

    for record in records {
        let bucket = width.bucket_of(record.acceptance_time_of_day);
        *counts.entry((record.acceptance_date, bucket)).or_default() += 1;
        *totals.entry(record.acceptance_date).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|((date, bucket), filing_count)| {
            let daily_total = totals.get(&date).copied().unwrap_or_default();
            BucketShare {
                date,
                bucket,
                filing_count,
                daily_total,
                percent_of_day: pct(filing_count, daily_total),
            }
        })
        .collect()
}

/// Averages `percent_of_day` per bucket across days, ordered by time of day.
pub fn average_by_bucket(shares: &[BucketShare], policy: MissingBucketPolicy) -> Vec<BucketAverage> {
    let mut per_bucket: BTreeMap<NaiveTime, (f64, usize)> = BTreeMap::new();
    let days = day_count(shares);

    for share in shares {
        let entry = per_bucket.entry(share.bucket).or_default();
        entry.0 += share.percent_of_day;
        entry.1 += 1;
    }

    per_bucket
        .into_iter()
        .map(|(bucket, (sum, observed_days))| {
            let denominator = match policy {
                MissingBucketPolicy::Omit => observed_days,
                MissingBucketPolicy::ZeroFill => days,
            };
            BucketAverage {
                bucket,
                seconds_since_midnight: bucket.num_seconds_from_midnight(),
                avg_percent_of_day: if denominator == 0 {
                    0.0
                } else {
                    sum / denominator as f64
                },
                observed_days,
            }
        })
        .collect()
}

/// Count of distinct dates in `shares`.
pub fn day_count(shares: &[BucketShare]) -> usize {
    shares.iter().map(|s| s.date).collect::<BTreeSet<_>>().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Normalizer;
    use crate::record::FilingRecord;

    fn accepted_at(utc: &str) -> DerivedRecord {
        Normalizer::new(chrono_tz::UTC)
            .normalize(&FilingRecord {
                accession_number: utc.to_string(),
                detected_time: Some(utc.to_string()),
                acceptance_date_time: Some(utc.to_string()),
                ..Default::default()
            })
            .unwrap()
    }

    fn hms(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_worked_example() {
        let records = vec![
            accepted_at("2025-06-02T09:32:10Z"),
            accepted_at("2025-06-02T09:34:59Z"),
            accepted_at("2025-06-02T09:36:00Z"),
        ];
        let shares = daily_bucket_shares(&records, BucketWidth::default());

        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].bucket, hms(9, 30));
        assert_eq!(shares[0].filing_count, 2);
        assert_eq!(shares[0].daily_total, 3);
        assert!((shares[0].percent_of_day - 66.666_666).abs() < 1e-4);
        assert_eq!(shares[1].bucket, hms(9, 35));
        assert_eq!(shares[1].filing_count, 1);
        assert!((shares[1].percent_of_day - 33.333_333).abs() < 1e-4);
    }

    #[test]
    fn test_each_day_sums_to_total_and_hundred() {
        let records: Vec<_> = [
            "2025-06-02T09:01:00Z",
            "2025-06-02T09:02:00Z",
            "2025-06-02T13:17:00Z",
            "2025-06-02T22:59:00Z",
            "2025-06-03T00:00:00Z",
            "2025-06-03T11:11:11Z",
            "2025-06-03T11:14:00Z",
        ]
        .iter()
        .map(|ts| accepted_at(ts))
        .collect();
        let shares = daily_bucket_shares(&records, BucketWidth::default());

        let mut per_day: BTreeMap<NaiveDate, (usize, usize, f64)> = BTreeMap::new();
        for s in &shares {
            let entry = per_day.entry(s.date).or_default();
            entry.0 += s.filing_count;
            entry.1 = s.daily_total;
            entry.2 += s.percent_of_day;
        }

        assert_eq!(per_day.len(), 2);
        for (count_sum, total, pct_sum) in per_day.values() {
            assert_eq!(count_sum, total);
            assert!((pct_sum - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_missing_buckets_are_omitted_by_default() {
        // Day 1: 09:30 and 10:00 each 50%. Day 2: only 09:30 (100%).
        let records = vec![
            accepted_at("2025-06-02T09:30:00Z"),
            accepted_at("2025-06-02T10:00:00Z"),
            accepted_at("2025-06-03T09:31:00Z"),
        ];
        let shares = daily_bucket_shares(&records, BucketWidth::default());

        let omit = average_by_bucket(&shares, MissingBucketPolicy::Omit);
        assert_eq!(omit.len(), 2);
        assert_eq!(omit[0].bucket, hms(9, 30));
        assert_eq!(omit[0].avg_percent_of_day, 75.0);
        assert_eq!(omit[0].observed_days, 2);
        assert_eq!(omit[1].bucket, hms(10, 0));
        assert_eq!(omit[1].avg_percent_of_day, 50.0);
        assert_eq!(omit[1].observed_days, 1);
        assert_eq!(omit[1].seconds_since_midnight, 36_000);

        let zero = average_by_bucket(&shares, MissingBucketPolicy::ZeroFill);
        assert_eq!(zero[0].avg_percent_of_day, 75.0);
        assert_eq!(zero[1].avg_percent_of_day, 25.0);
    }

    #[test]
    fn test_empty_input() {
        let shares = daily_bucket_shares(&[], BucketWidth::default());
        assert!(shares.is_empty());
        assert!(average_by_bucket(&shares, MissingBucketPolicy::ZeroFill).is_empty());
        assert_eq!(day_count(&shares), 0);
    }
}
