//! Metric aggregation windows.

use chrono::NaiveDate;

use crate::domain::foundation::{Timestamp, ValidationError};

/// Half-open time interval `[start, end)` used for metric aggregation.
///
/// Every aggregation pairs a window with the equal-length window immediately
/// preceding it for growth comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricWindow {
    start: Timestamp,
    end: Timestamp,
}

impl MetricWindow {
    /// Creates a window; `end` must be strictly after `start`.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, ValidationError> {
        if !end.is_after(&start) {
            return Err(ValidationError::invalid_format(
                "window",
                "endDate must be after startDate",
            ));
        }
        Ok(Self { start, end })
    }

    /// Creates a window from calendar dates; the end date is exclusive.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        let start_ts = Timestamp::from_datetime(start.and_hms_opt(0, 0, 0).unwrap().and_utc());
        let end_ts = Timestamp::from_datetime(end.and_hms_opt(0, 0, 0).unwrap().and_utc());
        Self::new(start_ts, end_ts)
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    /// Window length in seconds.
    pub fn duration_secs(&self) -> i64 {
        self.end.as_unix_secs() - self.start.as_unix_secs()
    }

    /// The equal-length window immediately preceding this one.
    pub fn previous(&self) -> MetricWindow {
        let duration = self.duration_secs();
        MetricWindow {
            start: Timestamp::from_unix_secs(self.start.as_unix_secs() - duration),
            end: self.start,
        }
    }

    /// Half-open containment check.
    pub fn contains(&self, ts: &Timestamp) -> bool {
        !ts.is_before(&self.start) && ts.is_before(&self.end)
    }

    /// Number of UTC calendar days covered: `ceil(duration / 1 day)`.
    pub fn day_count(&self) -> i64 {
        (self.duration_secs() + 86_399) / 86_400
    }

    /// The UTC calendar days of the window, ascending, seeded from the
    /// start day. Every day appears even when it saw no activity.
    pub fn days(&self) -> Vec<NaiveDate> {
        let first = self.start.date_utc();
        (0..self.day_count())
            .map(|offset| first + chrono::Duration::days(offset))
            .collect()
    }
}
