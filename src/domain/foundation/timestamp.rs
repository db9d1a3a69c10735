//! Timestamp value object for immutable points in time.
//!
//! All time handling is UTC. Besides the usual constructors, this module owns
//! the single normalization function for the loosely-typed creation
//! timestamps that come back from the document store, which over the app's
//! history have been written in three shapes: an RFC 3339 string, a
//! `{seconds: n}` / `{_seconds: n}` wrapper object, and a bare epoch-seconds
//! number.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::errors::ValidationError;

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Creates a timestamp from Unix seconds.
    pub fn from_unix_secs(secs: i64) -> Self {
        Self(Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the timestamp as Unix seconds.
    pub fn as_unix_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// Returns the UTC calendar date of this timestamp.
    pub fn date_utc(&self) -> NaiveDate {
        self.0.date_naive()
    }

    /// Formats as RFC 3339 (the wire format for the mobile client).
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Creates a new timestamp by adding the specified number of days.
    ///
    /// Negative values subtract days.
    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Normalizes a loosely-typed timestamp value into a canonical instant.
    ///
    /// Accepted shapes, in order of preference:
    /// 1. RFC 3339 string (`"2024-01-15T10:30:00Z"`) or bare ISO date
    /// 2. Wrapper object with `seconds` or `_seconds` (number or string)
    /// 3. Bare number of epoch seconds
    ///
    /// Call this at every ingestion boundary; nothing else in the codebase
    /// should interpret raw timestamp values.
    pub fn parse_flexible(value: &serde_json::Value) -> Result<Self, ValidationError> {
        match value {
            serde_json::Value::String(s) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                    return Ok(Self(dt.with_timezone(&Utc)));
                }
                if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    let dt = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
                    return Ok(Self(dt));
                }
                Err(ValidationError::invalid_format(
                    "timestamp",
                    format!("unparseable string '{}'", s),
                ))
            }
            serde_json::Value::Number(n) => {
                let secs = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).ok_or(
                    ValidationError::invalid_format("timestamp", "non-integer epoch value"),
                )?;
                Ok(Self::from_unix_secs(secs))
            }
            serde_json::Value::Object(map) => {
                let seconds = map
                    .get("seconds")
                    .or_else(|| map.get("_seconds"))
                    .ok_or_else(|| {
                        ValidationError::invalid_format(
                            "timestamp",
                            "object without seconds field",
                        )
                    })?;
                let secs = match seconds {
                    serde_json::Value::Number(n) => n
                        .as_i64()
                        .or_else(|| n.as_f64().map(|f| f as i64)),
                    serde_json::Value::String(s) => s.parse().ok(),
                    _ => None,
                }
                .ok_or(ValidationError::invalid_format(
                    "timestamp",
                    "seconds field is not numeric",
                ))?;
                Ok(Self::from_unix_secs(secs))
            }
            _ => Err(ValidationError::invalid_format(
                "timestamp",
                "unsupported value shape",
            )),
        }
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self(Utc.timestamp_opt(0, 0).unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn now_is_between_before_and_after() {
        let before = Utc::now();
        let ts = Timestamp::now();
        let after = Utc::now();

        assert!(ts.as_datetime() >= &before);
        assert!(ts.as_datetime() <= &after);
    }

    #[test]
    fn unix_secs_roundtrip() {
        let ts = Timestamp::from_unix_secs(1704067200);
        assert_eq!(ts.as_unix_secs(), 1704067200);
        assert_eq!(ts.to_rfc3339(), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn date_utc_truncates_to_calendar_day() {
        let ts = Timestamp::from_unix_secs(1704103200); // 2024-01-01T10:00:00Z
        assert_eq!(
            ts.date_utc(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn add_days_moves_forward_and_backward() {
        let ts = Timestamp::from_unix_secs(1704067200);
        assert_eq!(ts.add_days(1).as_unix_secs(), 1704067200 + 86_400);
        assert_eq!(ts.add_days(-1).as_unix_secs(), 1704067200 - 86_400);
    }

    #[test]
    fn ordering_comparisons() {
        let earlier = Timestamp::from_unix_secs(100);
        let later = Timestamp::from_unix_secs(200);
        assert!(earlier.is_before(&later));
        assert!(later.is_after(&earlier));
        assert!(!earlier.is_after(&later));
    }

    #[test]
    fn serializes_as_rfc3339_string() {
        let ts = Timestamp::from_unix_secs(1704067200);
        let json = serde_json::to_string(&ts).unwrap();
        assert!(json.contains("2024-01-01"));
    }

    // parse_flexible: the three observed shapes

    #[test]
    fn parse_flexible_rfc3339_string() {
        let ts = Timestamp::parse_flexible(&json!("2024-01-15T10:30:00Z")).unwrap();
        assert_eq!(ts.as_unix_secs(), 1705314600);
    }

    #[test]
    fn parse_flexible_bare_date_string() {
        let ts = Timestamp::parse_flexible(&json!("2024-01-15")).unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-01-15T00:00:00Z");
    }

    #[test]
    fn parse_flexible_seconds_wrapper() {
        let ts = Timestamp::parse_flexible(&json!({"seconds": 1704067200})).unwrap();
        assert_eq!(ts.as_unix_secs(), 1704067200);
    }

    #[test]
    fn parse_flexible_underscore_seconds_wrapper() {
        let ts =
            Timestamp::parse_flexible(&json!({"_seconds": 1704067200, "_nanoseconds": 0}))
                .unwrap();
        assert_eq!(ts.as_unix_secs(), 1704067200);
    }

    #[test]
    fn parse_flexible_epoch_number() {
        let ts = Timestamp::parse_flexible(&json!(1704067200)).unwrap();
        assert_eq!(ts.as_unix_secs(), 1704067200);
    }

    #[test]
    fn parse_flexible_rejects_garbage() {
        assert!(Timestamp::parse_flexible(&json!("not a date")).is_err());
        assert!(Timestamp::parse_flexible(&json!(true)).is_err());
        assert!(Timestamp::parse_flexible(&json!({"minutes": 3})).is_err());
        assert!(Timestamp::parse_flexible(&json!(null)).is_err());
    }
}
