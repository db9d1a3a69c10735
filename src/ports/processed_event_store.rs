//! ProcessedEventStore port - tracks which webhook deliveries ran.
//!
//! Stripe redelivers events on timeouts, 5xx responses, and lost
//! acknowledgements, so reconciliation must be idempotent per event id. The
//! store's `save` uses check-and-insert semantics: the first writer wins and
//! everyone else observes `AlreadyExists`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::foundation::DomainError;

/// Record of a processed webhook event.
#[derive(Debug, Clone)]
pub struct ProcessedEvent {
    /// Stripe event id (evt_xxx format).
    pub event_id: String,

    /// Event type discriminant (e.g., "payment_intent.succeeded").
    pub event_type: String,

    /// When the event was processed.
    pub processed_at: DateTime<Utc>,

    /// Outcome: "success", "ignored", or "failed".
    pub outcome: String,

    /// Failure or ignore reason, when applicable.
    pub detail: Option<String>,
}

impl ProcessedEvent {
    pub fn success(event_id: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            outcome: "success".to_string(),
            detail: None,
        }
    }

    pub fn ignored(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            outcome: "ignored".to_string(),
            detail: Some(reason.into()),
        }
    }

    pub fn failed(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            processed_at: Utc::now(),
            outcome: "failed".to_string(),
            detail: Some(error.into()),
        }
    }
}

/// Result of attempting to record a processed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// First time seeing this event.
    Inserted,
    /// Another delivery of the same event already recorded it.
    AlreadyExists,
}

/// Port for the processed-event dedup store.
#[async_trait]
pub trait ProcessedEventStore: Send + Sync {
    /// Look up a previously processed event by its Stripe event id.
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<ProcessedEvent>, DomainError>;

    /// Record a processed event with create-if-absent semantics.
    async fn save(&self, record: ProcessedEvent) -> Result<SaveResult, DomainError>;

    /// Delete records processed before the cutoff; returns the count removed.
    ///
    /// Keeps the dedup set bounded (retention sweep, e.g. 30 days).
    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError>;
}
