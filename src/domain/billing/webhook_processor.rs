//! Idempotent webhook processing.
//!
//! Coordinates the dedup store and the per-event-type handlers so each
//! delivery is processed at most once:
//!
//! 1. Check the processed-event store for the event id
//! 2. Dispatch to the handler registered for the event type
//! 3. Record the outcome with check-and-insert (first writer wins)
//!
//! Concurrent deliveries of the same event race on step 3; the loser observes
//! `AlreadyExists` and reports `AlreadyProcessed`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::ports::{ProcessedEvent, ProcessedEventStore, SaveResult};

use super::stripe_event::{StripeEvent, StripeEventType};
use super::webhook_errors::WebhookError;

/// Handler for one or more webhook event types.
///
/// Implementations are stateless mappings from an event payload to document
/// store mutations. A handler failure is caught by the processor and recorded;
/// it never crashes the router.
#[async_trait]
pub trait WebhookEventHandler: Send + Sync {
    /// The event types this handler processes.
    fn handles(&self) -> &'static [StripeEventType];

    /// Reconciles the event into the document store.
    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError>;
}

/// Routes events to the handler registered for their type.
///
/// Unknown discriminants are permissive no-ops: logged for visibility and
/// acknowledged so the provider stops redelivering.
pub struct EventRouter {
    handlers: Vec<Arc<dyn WebhookEventHandler>>,
}

impl EventRouter {
    pub fn new(handlers: Vec<Arc<dyn WebhookEventHandler>>) -> Self {
        Self { handlers }
    }

    fn handler_for(&self, event_type: StripeEventType) -> Option<&dyn WebhookEventHandler> {
        self.handlers
            .iter()
            .find(|h| h.handles().contains(&event_type))
            .map(|handler| handler.as_ref())
    }

    /// Dispatches the event to exactly one handler.
    pub async fn dispatch(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let event_type = event.parsed_type();
        match self.handler_for(event_type) {
            Some(handler) => handler.handle(event).await,
            None => {
                tracing::info!(
                    event_id = %event.id,
                    event_type = %event.event_type,
                    "Unhandled webhook event type"
                );
                Err(WebhookError::Ignored(format!(
                    "no handler for event type '{}'",
                    event.event_type
                )))
            }
        }
    }
}

/// Outcome of processing a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The event was dispatched (or intentionally ignored) this time.
    Processed,
    /// A previous delivery of the same event already ran.
    AlreadyProcessed,
}

/// Webhook processor with per-event-id idempotency.
pub struct IdempotentWebhookProcessor {
    store: Arc<dyn ProcessedEventStore>,
    router: EventRouter,
}

impl IdempotentWebhookProcessor {
    pub fn new(store: Arc<dyn ProcessedEventStore>, router: EventRouter) -> Self {
        Self { store, router }
    }

    /// Processes a verified event at most once.
    ///
    /// Failed dispatches are recorded and returned as errors so the HTTP
    /// layer answers 5xx and the provider retries; a retry of a failed event
    /// is deliberately blocked by the recorded outcome until the record is
    /// swept, keeping duplicate side effects impossible. Retried deliveries
    /// of successful events acknowledge without re-running the handler.
    pub async fn process(&self, event: StripeEvent) -> Result<ProcessOutcome, WebhookError> {
        if self.store.find_by_event_id(&event.id).await?.is_some() {
            tracing::debug!(event_id = %event.id, "Duplicate webhook delivery skipped");
            return Ok(ProcessOutcome::AlreadyProcessed);
        }

        let result = self.router.dispatch(&event).await;

        let record = match &result {
            Ok(()) => ProcessedEvent::success(&event.id, &event.event_type),
            Err(WebhookError::Ignored(reason)) => {
                ProcessedEvent::ignored(&event.id, &event.event_type, reason)
            }
            Err(e) => ProcessedEvent::failed(&event.id, &event.event_type, e.to_string()),
        };

        match self.store.save(record).await? {
            SaveResult::Inserted => match result {
                Ok(()) | Err(WebhookError::Ignored(_)) => Ok(ProcessOutcome::Processed),
                Err(e) => Err(e),
            },
            SaveResult::AlreadyExists => Ok(ProcessOutcome::AlreadyProcessed),
        }
    }
}
