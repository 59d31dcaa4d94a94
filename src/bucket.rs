//! Fixed-width time-of-day buckets on local wall-clock time.

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};

use crate::error::ConfigError;

/// Width of a time-of-day bucket, in whole minutes.
///
/// Only widths that evenly divide an hour are accepted, so every bucket starts
/// on a boundary that lines up with the top of the hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketWidth {
    minutes: u32,
}

impl BucketWidth {
    pub fn new(minutes: u32) -> Result<Self, ConfigError> {
        if minutes == 0 || 60 % minutes != 0 {
            return Err(ConfigError::InvalidBucketWidth(minutes));
        }
        Ok(Self { minutes })
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// Start of the bucket containing `time`. Sub-second parts are dropped.
    pub fn bucket_of(&self, time: NaiveTime) -> NaiveTime {
        let width = self.minutes * 60;
        let secs = time.num_seconds_from_midnight();
        NaiveTime::default() + Duration::seconds(i64::from(secs - secs % width))
    }

    /// Truncates a local wall-clock instant to the start of its bucket.
    ///
    /// Callers must pass the time *after* timezone conversion; truncating the
    /// UTC instant gives different boundaries for offsets like +05:45.
    pub fn truncate(&self, local: NaiveDateTime) -> NaiveDateTime {
        local.date().and_time(self.bucket_of(local.time()))
    }
}

impl Default for BucketWidth {
    fn default() -> Self {
        Self { minutes: 5 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::to_local;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn test_rejects_widths_that_do_not_divide_an_hour() {
        assert!(BucketWidth::new(0).is_err());
        assert!(BucketWidth::new(7).is_err());
        assert!(BucketWidth::new(90).is_err());
        assert!(BucketWidth::new(5).is_ok());
        assert!(BucketWidth::new(60).is_ok());
    }

    #[test]
    fn test_five_minute_buckets() {
        let width = BucketWidth::default();
        assert_eq!(width.bucket_of(hms(9, 32, 10)), hms(9, 30, 0));
        assert_eq!(width.bucket_of(hms(9, 34, 59)), hms(9, 30, 0));
        assert_eq!(width.bucket_of(hms(9, 36, 0)), hms(9, 35, 0));
        assert_eq!(width.bucket_of(hms(23, 59, 59)), hms(23, 55, 0));
        assert_eq!(width.bucket_of(hms(0, 0, 0)), hms(0, 0, 0));
    }

    #[test]
    fn test_drops_fractional_seconds() {
        let width = BucketWidth::default();
        let t = NaiveTime::from_hms_milli_opt(9, 35, 0, 999).unwrap();
        assert_eq!(width.bucket_of(t), hms(9, 35, 0));
    }

    #[test]
    fn test_truncate_is_idempotent() {
        let width = BucketWidth::new(15).unwrap();
        let local = NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_milli_opt(16, 44, 12, 345)
            .unwrap();

        let once = width.truncate(local);
        assert_eq!(once.time(), hms(16, 30, 0));
        assert_eq!(once.date(), local.date());
        assert_eq!(width.truncate(once), once);
    }

    #[test]
    fn test_half_hour_offset_buckets_on_local_time() {
        // Kolkata is UTC+05:30, so local hour boundaries fall on UTC half hours.
        let width = BucketWidth::new(60).unwrap();
        let instant = Utc.with_ymd_and_hms(2025, 6, 2, 3, 10, 0).unwrap();
        let local = to_local(instant, chrono_tz::Asia::Kolkata);
        assert_eq!(local.time(), hms(8, 40, 0));

        let by_local = width.truncate(local.naive_local());
        assert_eq!(by_local.time(), hms(8, 0, 0));

        // Truncating the UTC instant first lands on 03:00 UTC, i.e. 08:30 local.
        let by_utc = chrono_tz::Asia::Kolkata
            .from_utc_datetime(&width.truncate(instant.naive_utc()))
            .naive_local();
        assert_eq!(by_utc.time(), hms(8, 30, 0));
        assert_ne!(by_local, by_utc);
    }
}
