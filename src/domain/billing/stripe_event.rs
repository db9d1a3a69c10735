//! Stripe webhook event types.
//!
//! Captures only the fields reconciliation needs; everything else in
//! Stripe's event schema is ignored. Parsing is deliberately lenient so the
//! permissive verification mode can still construct an event from a raw
//! request body.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Stripe webhook event (simplified).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "payment_intent.succeeded").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    #[serde(default)]
    pub created: i64,

    /// Object containing event-specific data.
    #[serde(default)]
    pub data: StripeEventData,

    /// Whether this is a live mode event (vs test mode).
    #[serde(default)]
    pub livemode: bool,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: serde_json::Value,
}

impl Default for StripeEventData {
    fn default() -> Self {
        Self {
            object: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

impl StripeEvent {
    /// Parse the event type into a known enum variant.
    pub fn parsed_type(&self) -> StripeEventType {
        StripeEventType::from_discriminant(&self.event_type)
    }

    /// Attempts to deserialize the data object as the specified type.
    pub fn deserialize_object<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.object.clone())
    }
}

/// Event types the reconciliation router dispatches on.
///
/// The set is closed but extensible: unrecognized discriminants map to
/// `Unknown` and are acknowledged without processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeEventType {
    CheckoutSessionCompleted,
    SubscriptionCreated,
    SubscriptionUpdated,
    SubscriptionDeleted,
    InvoicePaymentSucceeded,
    InvoicePaymentFailed,
    PaymentIntentSucceeded,
    Unknown,
}

impl StripeEventType {
    /// Parse an event type from its string discriminant.
    pub fn from_discriminant(s: &str) -> Self {
        match s {
            "checkout.session.completed" => Self::CheckoutSessionCompleted,
            "customer.subscription.created" => Self::SubscriptionCreated,
            "customer.subscription.updated" => Self::SubscriptionUpdated,
            "customer.subscription.deleted" => Self::SubscriptionDeleted,
            "invoice.payment_succeeded" => Self::InvoicePaymentSucceeded,
            "invoice.payment_failed" => Self::InvoicePaymentFailed,
            "payment_intent.succeeded" => Self::PaymentIntentSucceeded,
            _ => Self::Unknown,
        }
    }

    /// The Stripe discriminant string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckoutSessionCompleted => "checkout.session.completed",
            Self::SubscriptionCreated => "customer.subscription.created",
            Self::SubscriptionUpdated => "customer.subscription.updated",
            Self::SubscriptionDeleted => "customer.subscription.deleted",
            Self::InvoicePaymentSucceeded => "invoice.payment_succeeded",
            Self::InvoicePaymentFailed => "invoice.payment_failed",
            Self::PaymentIntentSucceeded => "payment_intent.succeeded",
            Self::Unknown => "unknown",
        }
    }
}

// ── Event payload objects ────────────────────────────────────────────────

/// `checkout.session` object fields used by reconciliation.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    /// The app passes the user id through `client_reference_id`.
    #[serde(default)]
    pub client_reference_id: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
}

/// `payment_intent` object fields used by reconciliation.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntentObject {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl PaymentIntentObject {
    pub fn user_id(&self) -> Option<&str> {
        self.metadata.get("userId").map(String::as_str)
    }

    pub fn price_id(&self) -> Option<&str> {
        self.metadata.get("priceId").map(String::as_str)
    }
}

/// `subscription` object fields used by reconciliation.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    pub id: String,
    pub customer: String,
    pub status: String,
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

impl SubscriptionObject {
    /// Whether this subscription grants premium access.
    pub fn grants_premium(&self) -> bool {
        matches!(self.status.as_str(), "active" | "trialing")
    }
}

/// `invoice` object fields used by reconciliation.
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceObject {
    pub id: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub subscription: Option<String>,
    #[serde(default)]
    pub period_end: Option<i64>,
}

#[cfg(test)]
pub use test_support::StripeEventBuilder;
