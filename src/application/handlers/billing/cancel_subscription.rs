//! CancelSubscriptionHandler - immediate or period-end cancellation.

use std::sync::Arc;

use crate::domain::foundation::Timestamp;
use crate::ports::PaymentProvider;

use super::BillingError;

/// Command to cancel a subscription.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionCommand {
    pub subscription_id: String,
    /// Cancel now instead of at the end of the billing period.
    pub immediately: bool,
}

/// Cancellation result.
#[derive(Debug, Clone)]
pub struct CancelSubscriptionResult {
    /// When the provider recorded the cancellation; absent for a pending
    /// period-end cancellation.
    pub cancelled_at: Option<Timestamp>,
}

pub struct CancelSubscriptionHandler {
    payment_provider: Arc<dyn PaymentProvider>,
}

impl CancelSubscriptionHandler {
    pub fn new(payment_provider: Arc<dyn PaymentProvider>) -> Self {
        Self { payment_provider }
    }

    pub async fn handle(
        &self,
        cmd: CancelSubscriptionCommand,
    ) -> Result<CancelSubscriptionResult, BillingError> {
        if cmd.subscription_id.trim().is_empty() {
            return Err(BillingError::MissingField("subscriptionId"));
        }

        let subscription = self
            .payment_provider
            .cancel_subscription(&cmd.subscription_id, cmd.immediately)
            .await?;

        tracing::info!(
            subscription_id = %subscription.id,
            immediately = cmd.immediately,
            "Cancelled subscription"
        );

        Ok(CancelSubscriptionResult {
            cancelled_at: subscription.canceled_at.map(Timestamp::from_unix_secs),
        })
    }
}
