use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::analyzers::distribution::MissingBucketPolicy;
use crate::analyzers::filter::TimeWindow;
use crate::bucket::BucketWidth;
use crate::error::ConfigError;

/// Tunables shared by every analysis.
///
/// Stored as a JSON object on disk; every field is optional:
/// ```json
/// {
///   "timezone": "US/Eastern",
///   "bucket_minutes": 5,
///   "market_open": "09:30:00",
///   "market_close": "16:00:00",
///   "filing_cutoff": "17:30:00",
///   "early_cutoff": "01:00:00",
///   "missing_buckets": "omit"
/// }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub timezone: String,
    pub bucket_minutes: u32,
    pub market_open: NaiveTime,
    pub market_close: NaiveTime,
    /// Last acceptance time for same-day regulatory dissemination.
    pub filing_cutoff: NaiveTime,
    /// Acceptances at or before this time are ignored when looking for the
    /// earliest acceptance of the day.
    pub early_cutoff: NaiveTime,
    pub missing_buckets: MissingBucketPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            timezone: "US/Eastern".to_string(),
            bucket_minutes: 5,
            market_open: hms(9, 30),
            market_close: hms(16, 0),
            filing_cutoff: hms(17, 30),
            early_cutoff: hms(1, 0),
            missing_buckets: MissingBucketPolicy::Omit,
        }
    }
}

fn hms(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::default() + chrono::Duration::minutes(i64::from(hour * 60 + minute))
}

impl AnalysisConfig {
    /// Loads the config from a JSON file at `path` and validates it.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tz()?;
        self.bucket_width()?;
        self.market_hours()?;
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimezone(self.timezone.clone()))
    }

    pub fn bucket_width(&self) -> Result<BucketWidth, ConfigError> {
        BucketWidth::new(self.bucket_minutes)
    }

    pub fn market_hours(&self) -> Result<TimeWindow, ConfigError> {
        TimeWindow::new(self.market_open, self.market_close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        config.validate().unwrap();
        assert_eq!(config.tz().unwrap(), chrono_tz::US::Eastern);
        assert_eq!(config.bucket_width().unwrap().minutes(), 5);
        assert_eq!(config.market_open, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(config.filing_cutoff, NaiveTime::from_hms_opt(17, 30, 0).unwrap());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            AnalysisConfig::from_json(r#"{"bucket_minutes": 15, "missing_buckets": "zero_fill"}"#)
                .unwrap();
        assert_eq!(config.bucket_minutes, 15);
        assert_eq!(config.missing_buckets, MissingBucketPolicy::ZeroFill);
        assert_eq!(config.timezone, "US/Eastern");
    }

    #[test]
    fn test_unknown_timezone() {
        let err = AnalysisConfig::from_json(r#"{"timezone": "Mars/Olympus"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTimezone(_)));
    }

    #[test]
    fn test_invalid_market_hours() {
        let err = AnalysisConfig::from_json(r#"{"market_open": "17:00:00", "market_close": "09:00:00"}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWindow { .. }));
    }

    #[test]
    fn test_invalid_bucket_width() {
        let err = AnalysisConfig::from_json(r#"{"bucket_minutes": 7}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBucketWidth(7)));
    }
}
