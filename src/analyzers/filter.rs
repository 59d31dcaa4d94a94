//! Record filters for same-day, market-hours and delay analyses.

use chrono::{NaiveTime, Weekday};

use crate::error::ConfigError;
use crate::record::DerivedRecord;

/// Inclusive time-of-day range, e.g. market hours 09:30–16:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, ConfigError> {
        if start >= end {
            return Err(ConfigError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time <= self.end
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }
}

/// Composable predicate over [`DerivedRecord`]s. An empty filter keeps everything.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    same_day: bool,
    next_day: bool,
    positive_delay: bool,
    acceptance_window: Option<TimeWindow>,
    accepted_after: Option<NaiveTime>,
    weekday: Option<Weekday>,
    submission_type: Option<String>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep records detected on the same local date they were accepted.
    pub fn same_day(mut self) -> Self {
        self.same_day = true;
        self
    }

    /// Keep records detected on a later local date than they were accepted.
    pub fn next_day(mut self) -> Self {
        self.next_day = true;
        self
    }

    /// Drop zero and negative delays, which have no place on a log axis.
    pub fn positive_delay(mut self) -> Self {
        self.positive_delay = true;
        self
    }

    pub fn accepted_within(mut self, window: TimeWindow) -> Self {
        self.acceptance_window = Some(window);
        self
    }

    /// Keep acceptances strictly after `time` of day.
    pub fn accepted_after(mut self, time: NaiveTime) -> Self {
        self.accepted_after = Some(time);
        self
    }

    pub fn on_weekday(mut self, weekday: Weekday) -> Self {
        self.weekday = Some(weekday);
        self
    }

    pub fn with_submission_type(mut self, submission_type: &str) -> Self {
        self.submission_type = Some(submission_type.to_string());
        self
    }

    pub fn matches(&self, record: &DerivedRecord) -> bool {
        if self.same_day && !record.is_same_day() {
            return false;
        }
        if self.next_day && !record.is_next_day() {
            return false;
        }
        if self.positive_delay && record.delay_seconds <= 0.0 {
            return false;
        }
        if let Some(window) = &self.acceptance_window {
            if !window.contains(record.acceptance_time_of_day) {
                return false;
            }
        }
        if let Some(after) = self.accepted_after {
            if record.acceptance_time_of_day <= after {
                return false;
            }
        }
        if let Some(weekday) = self.weekday {
            if record.acceptance_weekday() != weekday {
                return false;
            }
        }
        if let Some(wanted) = &self.submission_type {
            if record.submission_type.as_deref() != Some(wanted.as_str()) {
                return false;
            }
        }
        true
    }

    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a DerivedRecord>
    where
        I: IntoIterator<Item = &'a DerivedRecord>,
    {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Normalizer;
    use crate::record::FilingRecord;

    fn filing(form: &str, detected: &str, accepted: &str) -> DerivedRecord {
        Normalizer::default()
            .normalize(&FilingRecord {
                accession_number: format!("{form}-{accepted}"),
                submission_type: Some(form.to_string()),
                detected_time: Some(detected.to_string()),
                acceptance_date_time: Some(accepted.to_string()),
                size: Some("10".to_string()),
                line: 0,
            })
            .unwrap()
    }

    fn hms(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_window_is_inclusive() {
        let window = TimeWindow::new(hms(9, 30), hms(16, 0)).unwrap();
        assert!(window.contains(hms(9, 30)));
        assert!(window.contains(hms(16, 0)));
        assert!(!window.contains(hms(9, 29)));
        assert!(!window.contains(NaiveTime::from_hms_opt(16, 0, 1).unwrap()));
        assert!(TimeWindow::new(hms(16, 0), hms(9, 30)).is_err());
    }

    #[test]
    fn test_same_day_and_positive_delay() {
        // Friday 2025-06-06; Eastern is UTC-4.
        let records = vec![
            filing("8-K", "2025-06-06T14:00:30Z", "2025-06-06T14:00:00Z"),
            filing("8-K", "2025-06-06T14:00:00Z", "2025-06-06T14:00:00Z"),
            filing("8-K", "2025-06-07T04:30:00Z", "2025-06-06T22:00:00Z"),
            // Detected 0.4s after acceptance: rounds down to a zero delay.
            filing("8-K", "2025-06-06T14:10:00.400Z", "2025-06-06T14:10:00Z"),
        ];

        let same_day = RecordFilter::new().same_day().apply(&records);
        assert_eq!(same_day.len(), 3);

        let positive = RecordFilter::new().same_day().positive_delay().apply(&records);
        assert_eq!(positive.len(), 1);
        assert_eq!(positive[0].delay_seconds, 30.0);

        let next_day = RecordFilter::new().next_day().apply(&records);
        assert_eq!(next_day.len(), 1);
        assert_eq!(next_day[0].acceptance_time_of_day, hms(18, 0));
    }

    #[test]
    fn test_market_hours_weekday_and_type() {
        let records = vec![
            filing("8-K", "2025-06-06T13:31:00Z", "2025-06-06T13:30:00Z"),
            filing("10-Q", "2025-06-06T15:01:00Z", "2025-06-06T15:00:00Z"),
            filing("8-K", "2025-06-05T15:01:00Z", "2025-06-05T15:00:00Z"),
            filing("8-K", "2025-06-06T21:01:00Z", "2025-06-06T21:00:00Z"),
        ];
        let market = TimeWindow::new(hms(9, 30), hms(16, 0)).unwrap();

        assert_eq!(RecordFilter::new().accepted_within(market).apply(&records).len(), 3);

        let friday_8k = RecordFilter::new()
            .same_day()
            .on_weekday(Weekday::Fri)
            .with_submission_type("8-K")
            .apply(&records);
        assert_eq!(friday_8k.len(), 2);

        let after = RecordFilter::new().accepted_after(hms(9, 30)).apply(&records);
        assert_eq!(after.len(), 3);
    }
}
