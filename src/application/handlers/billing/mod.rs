//! Billing command/query handlers.

mod cancel_subscription;
mod create_checkout_session;
mod create_portal_session;
mod get_subscription_status;

pub use cancel_subscription::{
    CancelSubscriptionCommand, CancelSubscriptionHandler, CancelSubscriptionResult,
};
pub use create_checkout_session::{
    CheckoutSessionCreated, CreateCheckoutSessionCommand, CreateCheckoutSessionHandler,
};
pub use create_portal_session::{
    CreatePortalSessionCommand, CreatePortalSessionHandler, PortalSessionCreated,
};
pub use get_subscription_status::{
    GetSubscriptionStatusHandler, GetSubscriptionStatusQuery, SubscriptionStatusView,
};

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::PaymentError;

/// Errors surfaced by the billing endpoints.
#[derive(Debug, Error)]
pub enum BillingError {
    /// A required request field is missing or empty.
    #[error("Missing {0}")]
    MissingField(&'static str),

    /// The referenced user document does not exist.
    #[error("User not found")]
    UserNotFound,

    /// The payment provider rejected or failed the operation.
    #[error("{0}")]
    Payment(String),

    /// The document store failed.
    #[error("{0}")]
    Store(String),
}

impl From<PaymentError> for BillingError {
    fn from(err: PaymentError) -> Self {
        BillingError::Payment(err.to_string())
    }
}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::UserNotFound => BillingError::UserNotFound,
            _ => BillingError::Store(err.to_string()),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Configurable payment provider stub shared by handler tests.

    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::domain::metrics::MetricWindow;
    use crate::ports::{
        CreateCustomerRequest, CreatePaymentIntentRequest, Customer, PaymentError,
        PaymentIntent, PaymentProvider, PaymentRecord, PortalSession, Price, Subscription,
        SubscriptionStatus,
    };

    #[derive(Default)]
    pub struct StubPaymentProvider {
        pub price: Option<Price>,
        pub existing_customer: Option<Customer>,
        pub subscriptions: Vec<Subscription>,
        pub payments: Vec<PaymentRecord>,
        pub refunded_by_charge: std::collections::HashMap<String, i64>,
        pub fail_with: Option<PaymentError>,
        pub created_intents: Mutex<Vec<CreatePaymentIntentRequest>>,
        pub created_customers: Mutex<Vec<CreateCustomerRequest>>,
        pub cancel_calls: Mutex<Vec<(String, bool)>>,
    }

    impl StubPaymentProvider {
        pub fn new() -> Self {
            Self::default()
        }

        fn check_failure(&self) -> Result<(), PaymentError> {
            match &self.fail_with {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl PaymentProvider for StubPaymentProvider {
        async fn get_price(&self, price_id: &str) -> Result<Price, PaymentError> {
            self.check_failure()?;
            self.price
                .clone()
                .ok_or_else(|| PaymentError::not_found(price_id))
        }

        async fn find_customer_by_email(
            &self,
            _email: &str,
        ) -> Result<Option<Customer>, PaymentError> {
            self.check_failure()?;
            Ok(self.existing_customer.clone())
        }

        async fn create_customer(
            &self,
            request: CreateCustomerRequest,
        ) -> Result<Customer, PaymentError> {
            self.check_failure()?;
            let customer = Customer {
                id: "cus_created".to_string(),
                email: Some(request.email.clone()),
            };
            self.created_customers.lock().unwrap().push(request);
            Ok(customer)
        }

        async fn create_payment_intent(
            &self,
            request: CreatePaymentIntentRequest,
        ) -> Result<PaymentIntent, PaymentError> {
            self.check_failure()?;
            let intent = PaymentIntent {
                id: "pi_created".to_string(),
                client_secret: "pi_created_secret_abc".to_string(),
            };
            self.created_intents.lock().unwrap().push(request);
            Ok(intent)
        }

        async fn list_payments(
            &self,
            window: &MetricWindow,
            _limit: u32,
        ) -> Result<Vec<PaymentRecord>, PaymentError> {
            self.check_failure()?;
            Ok(self
                .payments
                .iter()
                .filter(|p| window.contains(&p.created))
                .cloned()
                .collect())
        }

        async fn get_refunded_amount(&self, charge_id: &str) -> Result<i64, PaymentError> {
            self.check_failure()?;
            Ok(self.refunded_by_charge.get(charge_id).copied().unwrap_or(0))
        }

        async fn list_subscriptions(
            &self,
            _customer_id: &str,
            limit: u32,
        ) -> Result<Vec<Subscription>, PaymentError> {
            self.check_failure()?;
            Ok(self
                .subscriptions
                .iter()
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn cancel_subscription(
            &self,
            subscription_id: &str,
            immediately: bool,
        ) -> Result<Subscription, PaymentError> {
            self.check_failure()?;
            self.cancel_calls
                .lock()
                .unwrap()
                .push((subscription_id.to_string(), immediately));
            Ok(Subscription {
                id: subscription_id.to_string(),
                customer_id: "cus_1".to_string(),
                status: if immediately {
                    SubscriptionStatus::Canceled
                } else {
                    SubscriptionStatus::Active
                },
                current_period_end: Some(1_735_689_600),
                cancel_at_period_end: !immediately,
                canceled_at: Some(1_704_067_200),
            })
        }

        async fn create_portal_session(
            &self,
            _customer_id: &str,
            return_url: &str,
        ) -> Result<PortalSession, PaymentError> {
            self.check_failure()?;
            Ok(PortalSession {
                id: "bps_1".to_string(),
                url: format!("https://billing.stripe.com/session?return={}", return_url),
            })
        }
    }
}
