//! Revenue metric reduction.

use crate::ports::PaymentRecord;

use super::growth_percent;

/// Revenue summary for a window, in major currency units.
#[derive(Debug, Clone, PartialEq)]
pub struct RevenueMetrics {
    /// Gross revenue: sum of succeeded amounts.
    pub total: f64,
    /// Gross minus refunded amounts.
    pub net: f64,
    /// Gross divided by the number of succeeded payments (0 for none).
    pub average_transaction_value: f64,
    /// Growth versus the preceding window, in percent.
    pub growth_percent: f64,
}

/// Sum of succeeded amounts, in minor units.
pub fn succeeded_total_minor(records: &[PaymentRecord]) -> i64 {
    records
        .iter()
        .filter(|r| r.status.is_succeeded())
        .map(|r| r.amount_minor)
        .sum()
}

/// Reduces the current window's records plus the per-charge refund total into
/// a revenue summary. `refunded_minor` is the sum of refunded amounts looked
/// up for the current window's succeeded records.
pub fn reduce_revenue(
    current: &[PaymentRecord],
    refunded_minor: i64,
    previous: &[PaymentRecord],
) -> RevenueMetrics {
    let total_minor = succeeded_total_minor(current);
    let previous_total_minor = succeeded_total_minor(previous);
    let succeeded_count = current.iter().filter(|r| r.status.is_succeeded()).count();

    let total = total_minor as f64 / 100.0;
    let net = (total_minor - refunded_minor) as f64 / 100.0;
    let average_transaction_value = if succeeded_count == 0 {
        0.0
    } else {
        total / succeeded_count as f64
    };

    RevenueMetrics {
        total,
        net,
        average_transaction_value,
        growth_percent: growth_percent(total, previous_total_minor as f64 / 100.0),
    }
}
