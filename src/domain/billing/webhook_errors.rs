//! Error types for webhook processing.
//!
//! Status-code mapping is part of the contract with Stripe's delivery retry:
//! 2xx acknowledges, 4xx drops, 5xx retries.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

/// Errors that occur during webhook verification and processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Event is older than the replay window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse the signature header or JSON payload.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Event was acknowledged but intentionally not processed.
    #[error("Event ignored: {0}")]
    Ignored(String),

    /// Document store operation failed while reconciling.
    #[error("Store error: {0}")]
    Store(String),
}

impl WebhookError {
    /// Whether Stripe should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Store(_))
    }

    /// HTTP status code returned to Stripe for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Verification failures: reject, no retry
            WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_) => StatusCode::BAD_REQUEST,

            // Ignored events are acknowledged so Stripe stops redelivering
            WebhookError::Ignored(_) => StatusCode::OK,

            // Reconciliation failures: Stripe retries on 5xx
            WebhookError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Store(err.to_string())
    }
}
