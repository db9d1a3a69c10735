//! GetSubscriptionStatusHandler - subscription state for the mobile client.

use std::sync::Arc;

use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{PaymentProvider, UserStore};

use super::BillingError;

/// Query for a user's subscription status.
#[derive(Debug, Clone)]
pub struct GetSubscriptionStatusQuery {
    pub user_id: String,
}

/// Subscription state as the mobile client consumes it.
///
/// `status` defaults to `"free"` when the user has no customer reference or
/// no subscriptions; the other fields are null in that case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionStatusView {
    pub subscription_id: Option<String>,
    pub customer_id: Option<String>,
    pub status: String,
    pub current_period_end: Option<String>,
    pub cancel_at_period_end: Option<bool>,
    pub canceled_at: Option<String>,
}

impl SubscriptionStatusView {
    fn free(customer_id: Option<String>) -> Self {
        Self {
            subscription_id: None,
            customer_id,
            status: "free".to_string(),
            current_period_end: None,
            cancel_at_period_end: None,
            canceled_at: None,
        }
    }
}

pub struct GetSubscriptionStatusHandler {
    users: Arc<dyn UserStore>,
    payment_provider: Arc<dyn PaymentProvider>,
}

impl GetSubscriptionStatusHandler {
    pub fn new(users: Arc<dyn UserStore>, payment_provider: Arc<dyn PaymentProvider>) -> Self {
        Self {
            users,
            payment_provider,
        }
    }

    pub async fn handle(
        &self,
        query: GetSubscriptionStatusQuery,
    ) -> Result<SubscriptionStatusView, BillingError> {
        let user_id =
            UserId::new(&query.user_id).map_err(|_| BillingError::MissingField("userId"))?;

        let account = self
            .users
            .get(&user_id)
            .await?
            .ok_or(BillingError::UserNotFound)?;

        let Some(customer_id) = account.stripe_customer_id else {
            return Ok(SubscriptionStatusView::free(None));
        };

        let subscriptions = self
            .payment_provider
            .list_subscriptions(&customer_id, 1)
            .await?;

        let Some(subscription) = subscriptions.into_iter().next() else {
            return Ok(SubscriptionStatusView::free(Some(customer_id)));
        };

        Ok(SubscriptionStatusView {
            subscription_id: Some(subscription.id),
            customer_id: Some(customer_id),
            status: subscription.status.as_str().to_string(),
            current_period_end: subscription
                .current_period_end
                .map(|s| Timestamp::from_unix_secs(s).to_rfc3339()),
            cancel_at_period_end: Some(subscription.cancel_at_period_end),
            canceled_at: subscription
                .canceled_at
                .map(|s| Timestamp::from_unix_secs(s).to_rfc3339()),
        })
    }
}
