//! PaymentProvider port - contract with the external payment service.
//!
//! The payment service's own semantics (pricing, customer objects,
//! subscription lifecycle) are not reimplemented; this port captures exactly
//! the operations the checkout endpoints, reconciliation, and metric
//! aggregation require of it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::metrics::MetricWindow;

/// Port for the payment provider (Stripe).
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Retrieve a price by id.
    async fn get_price(&self, price_id: &str) -> Result<Price, PaymentError>;

    /// Find an existing customer by email (first match).
    async fn find_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Customer>, PaymentError>;

    /// Create a customer tagged with the internal user id.
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError>;

    /// Create a payment intent for a one-time purchase.
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError>;

    /// List payment records created in the window, newest first, up to
    /// `limit` (the provider caps pages at 100).
    async fn list_payments(
        &self,
        window: &MetricWindow,
        limit: u32,
    ) -> Result<Vec<PaymentRecord>, PaymentError>;

    /// Total refunded amount (minor units) on a charge.
    async fn get_refunded_amount(&self, charge_id: &str) -> Result<i64, PaymentError>;

    /// List a customer's subscriptions (any status), up to `limit`.
    async fn list_subscriptions(
        &self,
        customer_id: &str,
        limit: u32,
    ) -> Result<Vec<Subscription>, PaymentError>;

    /// Cancel a subscription, either immediately or at period end.
    async fn cancel_subscription(
        &self,
        subscription_id: &str,
        immediately: bool,
    ) -> Result<Subscription, PaymentError>;

    /// Create a billing portal session for a customer.
    async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, PaymentError>;
}

/// A price object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Price {
    pub id: String,
    /// Amount in minor currency units.
    pub unit_amount: i64,
    pub currency: String,
}

/// Request to create a customer.
#[derive(Debug, Clone)]
pub struct CreateCustomerRequest {
    /// Internal user id, stored as provider metadata.
    pub user_id: UserId,
    pub email: String,
}

/// Customer in the payment system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub email: Option<String>,
}

/// Request to create a payment intent.
#[derive(Debug, Clone)]
pub struct CreatePaymentIntentRequest {
    /// Amount in minor units (taken from the retrieved price).
    pub amount: i64,
    pub currency: String,
    pub customer_id: Option<String>,
    pub receipt_email: Option<String>,
    /// Internal user id, carried through metadata for reconciliation.
    pub user_id: UserId,
    /// Price id, carried through metadata for plan classification.
    pub price_id: String,
}

/// Freshly created payment intent.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: String,
    /// Client secret the mobile app uses to confirm the payment.
    pub client_secret: String,
}

/// Status of a payment record.
///
/// Metrics partition these deliberately: `Succeeded` counts as success,
/// `RequiresPaymentMethod` and `Canceled` count as failures, and every other
/// status counts toward the total only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    Succeeded,
    Processing,
    RequiresPaymentMethod,
    Canceled,
    Other(String),
}

impl PaymentStatus {
    /// Parse the provider's status string.
    pub fn parse(s: &str) -> Self {
        match s {
            "succeeded" => PaymentStatus::Succeeded,
            "processing" => PaymentStatus::Processing,
            "requires_payment_method" => PaymentStatus::RequiresPaymentMethod,
            "canceled" => PaymentStatus::Canceled,
            other => PaymentStatus::Other(other.to_string()),
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, PaymentStatus::Succeeded)
    }

    /// The failure bucket: exactly `requires_payment_method` and `canceled`.
    pub fn is_failed(&self) -> bool {
        matches!(
            self,
            PaymentStatus::RequiresPaymentMethod | PaymentStatus::Canceled
        )
    }
}

/// A payment record as returned by the provider's list endpoint.
#[derive(Debug, Clone)]
pub struct PaymentRecord {
    pub id: String,
    /// Amount in minor currency units.
    pub amount_minor: i64,
    pub currency: String,
    pub status: PaymentStatus,
    pub created: Timestamp,
    /// Price id from metadata, when the checkout flow stamped one.
    pub price_id: Option<String>,
    /// Latest charge on this payment, for refund lookups.
    pub latest_charge: Option<String>,
}

/// Subscription in the payment system.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub id: String,
    pub customer_id: String,
    pub status: SubscriptionStatus,
    pub current_period_end: Option<i64>,
    pub cancel_at_period_end: bool,
    pub canceled_at: Option<i64>,
}

/// Subscription status from the payment provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
    Unpaid,
    Incomplete,
    IncompleteExpired,
    Paused,
    Unknown,
}

impl SubscriptionStatus {
    /// Parse the provider's status string.
    pub fn parse(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "trialing" => Self::Trialing,
            "past_due" => Self::PastDue,
            "canceled" => Self::Canceled,
            "unpaid" => Self::Unpaid,
            "incomplete" => Self::Incomplete,
            "incomplete_expired" => Self::IncompleteExpired,
            "paused" => Self::Paused,
            _ => Self::Unknown,
        }
    }

    /// The wire string reported to the mobile client.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Trialing => "trialing",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Unpaid => "unpaid",
            Self::Incomplete => "incomplete",
            Self::IncompleteExpired => "incomplete_expired",
            Self::Paused => "paused",
            Self::Unknown => "unknown",
        }
    }
}

/// Billing portal session.
#[derive(Debug, Clone)]
pub struct PortalSession {
    pub id: String,
    pub url: String,
}

/// Errors from payment provider operations.
#[derive(Debug, Clone)]
pub struct PaymentError {
    pub code: PaymentErrorCode,
    pub message: String,
    pub retryable: bool,
}

impl PaymentError {
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code.is_retryable(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ProviderError, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }

    pub fn malformed_response(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::MalformedResponse, message)
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

/// Payment error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentErrorCode {
    /// Network connectivity issue (includes upstream timeout).
    NetworkError,
    /// API authentication failed.
    AuthenticationError,
    /// Resource not found.
    NotFound,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Provider returned an API error.
    ProviderError,
    /// Provider response could not be parsed.
    MalformedResponse,
}

impl PaymentErrorCode {
    /// Network failures and rate limits are worth retrying upstream.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError | PaymentErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::NotFound => "not_found",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::ProviderError => "provider_error",
            PaymentErrorCode::MalformedResponse => "malformed_response",
        };
        write!(f, "{}", s)
    }
}
