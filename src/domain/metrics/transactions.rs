//! Transaction metric reduction.

use crate::ports::PaymentRecord;

/// Transaction counts for a window.
///
/// The partition is deliberate and non-obvious: failures are exactly
/// `requires_payment_method` and `canceled`; in-flight statuses like
/// `processing` count toward the total but neither bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionMetrics {
    pub total: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// `succeeded / total × 100`, 0 when the window is empty.
    pub success_rate: f64,
}

/// Reduces payment records into transaction counts.
pub fn reduce_transactions(records: &[PaymentRecord]) -> TransactionMetrics {
    let total = records.len() as u64;
    let succeeded = records.iter().filter(|r| r.status.is_succeeded()).count() as u64;
    let failed = records.iter().filter(|r| r.status.is_failed()).count() as u64;

    let success_rate = if total == 0 {
        0.0
    } else {
        succeeded as f64 / total as f64 * 100.0
    };

    TransactionMetrics {
        total,
        succeeded,
        failed,
        success_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use crate::ports::PaymentStatus;

    fn record(id: &str, status: &str) -> PaymentRecord {
        PaymentRecord {
            id: id.to_string(),
            amount_minor: 1_000,
            currency: "usd".to_string(),
            status: PaymentStatus::parse(status),
            created: Timestamp::from_unix_secs(1_704_067_200),
            price_id: None,
            latest_charge: None,
        }
    }

    #[test]
    fn partition_counts_every_bucket() {
        let records = vec![
            record("pi_1", "succeeded"),
            record("pi_2", "succeeded"),
            record("pi_3", "requires_payment_method"),
            record("pi_4", "canceled"),
            record("pi_5", "processing"),
            record("pi_6", "requires_action"),
        ];

        let metrics = reduce_transactions(&records);

        assert_eq!(metrics.total, 6);
        assert_eq!(metrics.succeeded, 2);
        assert_eq!(metrics.failed, 2);
        // processing and requires_action land in total only
        assert_eq!(metrics.total - metrics.succeeded - metrics.failed, 2);
    }

    #[test]
    fn success_rate_over_total() {
        let records = vec![
            record("pi_1", "succeeded"),
            record("pi_2", "canceled"),
            record("pi_3", "canceled"),
            record("pi_4", "canceled"),
        ];
        let metrics = reduce_transactions(&records);
        assert_eq!(metrics.success_rate, 25.0);
    }

    #[test]
    fn empty_window_has_zero_success_rate() {
        let metrics = reduce_transactions(&[]);
        assert_eq!(metrics.total, 0);
        assert_eq!(metrics.success_rate, 0.0);
    }
}
