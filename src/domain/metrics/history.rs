//! Historical revenue time series.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::ports::PaymentRecord;

use super::window::MetricWindow;

/// One data point of the daily revenue series.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRevenuePoint {
    /// UTC calendar day (ISO date on the wire).
    pub date: NaiveDate,
    /// Succeeded revenue for the day, major units, rounded to 2 decimals.
    pub revenue: f64,
}

/// Builds the daily revenue series for a window.
///
/// Every calendar day in the window is seeded at 0 so quiet days appear in
/// the dashboard chart; succeeded amounts accumulate per UTC day; output is
/// ascending by date.
pub fn daily_revenue_series(
    window: &MetricWindow,
    records: &[PaymentRecord],
) -> Vec<DailyRevenuePoint> {
    let mut per_day: BTreeMap<NaiveDate, i64> =
        window.days().into_iter().map(|d| (d, 0)).collect();

    for record in records.iter().filter(|r| r.status.is_succeeded()) {
        if let Some(bucket) = per_day.get_mut(&record.created.date_utc()) {
            *bucket += record.amount_minor;
        }
    }

    per_day
        .into_iter()
        .map(|(date, minor)| DailyRevenuePoint {
            date,
            revenue: round2(minor as f64 / 100.0),
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
