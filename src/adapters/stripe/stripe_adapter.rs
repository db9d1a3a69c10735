//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port over Stripe's REST API with
//! form-encoded requests and basic auth, mapping wire types into port types.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::domain::foundation::Timestamp;
use crate::domain::metrics::MetricWindow;
use crate::ports::{
    CreateCustomerRequest, CreatePaymentIntentRequest, Customer, PaymentError, PaymentErrorCode,
    PaymentIntent, PaymentProvider, PaymentRecord, PaymentStatus, PortalSession, Price,
    Subscription, SubscriptionStatus,
};

use super::api_types::{
    StripeCharge, StripeCustomer, StripeErrorEnvelope, StripeList, StripePaymentIntent,
    StripePortalSession, StripePrice, StripeSubscription,
};

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    api_key: SecretString,
    api_base_url: String,
}

impl StripeConfig {
    /// Creates a configuration for the public Stripe API.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_base_url: "https://api.stripe.com".to_string(),
        }
    }

    /// Overrides the API base URL (tests against a local stub).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Stripe implementation of the `PaymentProvider` port.
pub struct StripePaymentAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripePaymentAdapter {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, PaymentError> {
        let response = self
            .http_client
            .get(self.url(path))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .query(query)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;
        Self::decode(response).await
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, PaymentError> {
        let response = self
            .http_client
            .post(self.url(path))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(params)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;
        Self::decode(response).await
    }

    async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, PaymentError> {
        let response = self
            .http_client
            .delete(self.url(path))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;
        Self::decode(response).await
    }

    /// Maps a Stripe HTTP response to a typed result.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, PaymentError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| {
                PaymentError::malformed_response(format!("unexpected Stripe response: {}", e))
            });
        }

        let message = serde_json::from_str::<StripeErrorEnvelope>(&body)
            .ok()
            .and_then(|e| e.error.message)
            .unwrap_or_else(|| format!("HTTP {}", status));

        tracing::warn!(status = %status, error = %message, "Stripe API error");

        let code = match status.as_u16() {
            401 | 403 => PaymentErrorCode::AuthenticationError,
            404 => PaymentErrorCode::NotFound,
            429 => PaymentErrorCode::RateLimitExceeded,
            _ => PaymentErrorCode::ProviderError,
        };
        Err(PaymentError::new(code, message))
    }

    fn map_payment_record(pi: StripePaymentIntent) -> PaymentRecord {
        PaymentRecord {
            id: pi.id,
            amount_minor: pi.amount,
            currency: pi.currency,
            status: PaymentStatus::parse(&pi.status),
            created: Timestamp::from_unix_secs(pi.created),
            price_id: pi.metadata.get("priceId").cloned(),
            latest_charge: pi.latest_charge,
        }
    }

    fn map_subscription(sub: StripeSubscription) -> Subscription {
        Subscription {
            id: sub.id,
            customer_id: sub.customer,
            status: SubscriptionStatus::parse(&sub.status),
            current_period_end: sub.current_period_end,
            cancel_at_period_end: sub.cancel_at_period_end,
            canceled_at: sub.canceled_at,
        }
    }
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn get_price(&self, price_id: &str) -> Result<Price, PaymentError> {
        let price: StripePrice = self
            .get_json(&format!("/v1/prices/{}", price_id), &[])
            .await?;
        Ok(Price {
            unit_amount: price
                .unit_amount
                .ok_or_else(|| PaymentError::provider("price has no unit_amount"))?,
            id: price.id,
            currency: price.currency,
        })
    }

    async fn find_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Customer>, PaymentError> {
        let list: StripeList<StripeCustomer> = self
            .get_json(
                "/v1/customers",
                &[("email", email.to_string()), ("limit", "1".to_string())],
            )
            .await?;
        Ok(list
            .data
            .into_iter()
            .next()
            .filter(|c| !c.deleted)
            .map(|c| Customer {
                id: c.id,
                email: c.email,
            }))
    }

    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError> {
        let customer: StripeCustomer = self
            .post_form(
                "/v1/customers",
                &[
                    ("email", request.email.clone()),
                    ("metadata[userId]", request.user_id.to_string()),
                ],
            )
            .await?;
        Ok(Customer {
            id: customer.id,
            email: customer.email.or(Some(request.email)),
        })
    }

    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        let mut params = vec![
            ("amount", request.amount.to_string()),
            ("currency", request.currency.clone()),
            ("metadata[userId]", request.user_id.to_string()),
            ("metadata[priceId]", request.price_id.clone()),
        ];
        if let Some(customer_id) = &request.customer_id {
            params.push(("customer", customer_id.clone()));
        }
        if let Some(email) = &request.receipt_email {
            params.push(("receipt_email", email.clone()));
        }

        let intent: StripePaymentIntent = self.post_form("/v1/payment_intents", &params).await?;

        Ok(PaymentIntent {
            client_secret: intent
                .client_secret
                .ok_or_else(|| PaymentError::provider("payment intent has no client_secret"))?,
            id: intent.id,
        })
    }

    async fn list_payments(
        &self,
        window: &MetricWindow,
        limit: u32,
    ) -> Result<Vec<PaymentRecord>, PaymentError> {
        let list: StripeList<StripePaymentIntent> = self
            .get_json(
                "/v1/payment_intents",
                &[
                    ("created[gte]", window.start().as_unix_secs().to_string()),
                    ("created[lt]", window.end().as_unix_secs().to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(list.data.into_iter().map(Self::map_payment_record).collect())
    }

    async fn get_refunded_amount(&self, charge_id: &str) -> Result<i64, PaymentError> {
        let charge: StripeCharge = self
            .get_json(&format!("/v1/charges/{}", charge_id), &[])
            .await?;
        Ok(charge.amount_refunded)
    }

    async fn list_subscriptions(
        &self,
        customer_id: &str,
        limit: u32,
    ) -> Result<Vec<Subscription>, PaymentError> {
        let list: StripeList<StripeSubscription> = self
            .get_json(
                "/v1/subscriptions",
                &[
                    ("customer", customer_id.to_string()),
                    ("status", "all".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(list.data.into_iter().map(Self::map_subscription).collect())
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
        immediately: bool,
    ) -> Result<Subscription, PaymentError> {
        let sub: StripeSubscription = if immediately {
            self.delete_json(&format!("/v1/subscriptions/{}", subscription_id))
                .await?
        } else {
            self.post_form(
                &format!("/v1/subscriptions/{}", subscription_id),
                &[("cancel_at_period_end", "true".to_string())],
            )
            .await?
        };
        Ok(Self::map_subscription(sub))
    }

    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, PaymentError> {
        let session: StripePortalSession = self
            .post_form(
                "/v1/billing_portal/sessions",
                &[
                    ("customer", customer_id.to_string()),
                    ("return_url", return_url.to_string()),
                ],
            )
            .await?;
        Ok(PortalSession {
            id: session.id,
            url: session.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_public_api() {
        let adapter = StripePaymentAdapter::new(StripeConfig::new("sk_test_x"));
        assert_eq!(
            adapter.url("/v1/prices/price_1"),
            "https://api.stripe.com/v1/prices/price_1"
        );
    }

    #[test]
    fn config_base_url_override() {
        let adapter =
            StripePaymentAdapter::new(StripeConfig::new("sk_test_x").with_base_url("http://localhost:12111"));
        assert_eq!(
            adapter.url("/v1/charges/ch_1"),
            "http://localhost:12111/v1/charges/ch_1"
        );
    }

    #[test]
    fn payment_record_mapping_pulls_metadata_price() {
        let pi: StripePaymentIntent = serde_json::from_value(serde_json::json!({
            "id": "pi_1",
            "amount": 40000,
            "currency": "usd",
            "status": "succeeded",
            "created": 1704067200,
            "metadata": {"userId": "user-1", "priceId": "price_w"},
            "latest_charge": "ch_1"
        }))
        .unwrap();

        let record = StripePaymentAdapter::map_payment_record(pi);
        assert_eq!(record.price_id.as_deref(), Some("price_w"));
        assert_eq!(record.latest_charge.as_deref(), Some("ch_1"));
        assert!(record.status.is_succeeded());
        assert_eq!(record.created.as_unix_secs(), 1704067200);
    }

    #[test]
    fn subscription_mapping_parses_status() {
        let sub: StripeSubscription = serde_json::from_value(serde_json::json!({
            "id": "sub_1",
            "customer": "cus_1",
            "status": "past_due",
            "current_period_end": 1735689600,
            "cancel_at_period_end": true
        }))
        .unwrap();

        let mapped = StripePaymentAdapter::map_subscription(sub);
        assert_eq!(mapped.status, SubscriptionStatus::PastDue);
        assert!(mapped.cancel_at_period_end);
        assert_eq!(mapped.canceled_at, None);
    }
}
