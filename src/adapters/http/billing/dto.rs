//! Billing endpoint request/response bodies.
//!
//! Request fields are optional at the serde level so missing fields produce
//! the contract's 400 `{"error": ...}` body instead of axum's 422 rejection.

use serde::{Deserialize, Serialize};

use crate::application::handlers::billing::{
    CancelSubscriptionResult, CheckoutSessionCreated, PortalSessionCreated,
    SubscriptionStatusView,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutSessionRequest {
    #[serde(default)]
    pub price_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionResponse {
    pub client_secret: String,
    pub payment_intent_id: String,
    pub customer_id: Option<String>,
}

impl From<CheckoutSessionCreated> for CheckoutSessionResponse {
    fn from(result: CheckoutSessionCreated) -> Self {
        Self {
            client_secret: result.client_secret,
            payment_intent_id: result.payment_intent_id,
            customer_id: result.customer_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePortalSessionRequest {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub return_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PortalSessionResponse {
    pub url: String,
}

impl From<PortalSessionCreated> for PortalSessionResponse {
    fn from(result: PortalSessionCreated) -> Self {
        Self { url: result.url }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusParams {
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatusResponse {
    pub subscription_id: Option<String>,
    pub customer_id: Option<String>,
    pub status: String,
    pub current_period_end: Option<String>,
    pub cancel_at_period_end: Option<bool>,
    pub canceled_at: Option<String>,
}

impl From<SubscriptionStatusView> for SubscriptionStatusResponse {
    fn from(view: SubscriptionStatusView) -> Self {
        Self {
            subscription_id: view.subscription_id,
            customer_id: view.customer_id,
            status: view.status,
            current_period_end: view.current_period_end,
            cancel_at_period_end: view.cancel_at_period_end,
            canceled_at: view.canceled_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSubscriptionRequest {
    #[serde(default)]
    pub subscription_id: Option<String>,
    #[serde(default)]
    pub immediately: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSubscriptionResponse {
    pub cancelled_at: Option<String>,
}

impl From<CancelSubscriptionResult> for CancelSubscriptionResponse {
    fn from(result: CancelSubscriptionResult) -> Self {
        Self {
            cancelled_at: result.cancelled_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Webhook acknowledgement: `{"received": true}`.
#[derive(Debug, Serialize)]
pub struct WebhookAckResponse {
    pub received: bool,
}
