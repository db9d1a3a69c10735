//! Stripe API wire types.
//!
//! Only the fields the adapter reads are declared; Stripe's responses carry
//! far more.

use std::collections::HashMap;

use serde::Deserialize;

/// Paginated list envelope.
#[derive(Debug, Deserialize)]
pub struct StripeList<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct StripePrice {
    pub id: String,
    pub unit_amount: Option<i64>,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeCustomer {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

#[derive(Debug, Deserialize)]
pub struct StripePaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub created: i64,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub latest_charge: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StripeCharge {
    pub id: String,
    #[serde(default)]
    pub amount_refunded: i64,
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub customer: String,
    pub status: String,
    #[serde(default)]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    #[serde(default)]
    pub canceled_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StripePortalSession {
    pub id: String,
    pub url: String,
}

/// Error envelope returned by the Stripe API.
#[derive(Debug, Deserialize)]
pub struct StripeErrorEnvelope {
    pub error: StripeApiError,
}

#[derive(Debug, Deserialize)]
pub struct StripeApiError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}
