//! Axum HTTP adapters.
//!
//! Route paths and JSON field names reproduce the endpoints the mobile
//! client already calls; changing either breaks shipped app versions.

pub mod billing;
pub mod metrics;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::application::handlers::billing::{
    CancelSubscriptionHandler, CreateCheckoutSessionHandler, CreatePortalSessionHandler,
    GetSubscriptionStatusHandler,
};
use crate::application::handlers::metrics::MetricsAggregator;
use crate::domain::billing::{
    reconciliation_router, IdempotentWebhookProcessor, PlanCatalog, StripeWebhookVerifier,
};
use crate::ports::{PaymentProvider, ProcessedEventStore, ProgramStore, UserStore};

/// Shared application state; Arc-wrapped dependencies cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub users: Arc<dyn UserStore>,
    pub programs: Arc<dyn ProgramStore>,
    pub processed_events: Arc<dyn ProcessedEventStore>,
    pub verifier: Arc<StripeWebhookVerifier>,
    pub catalog: Arc<PlanCatalog>,
    pub portal_return_url: String,
}

impl AppState {
    pub fn checkout_handler(&self) -> CreateCheckoutSessionHandler {
        CreateCheckoutSessionHandler::new(self.payment_provider.clone(), self.users.clone())
    }

    pub fn portal_handler(&self) -> CreatePortalSessionHandler {
        CreatePortalSessionHandler::new(
            self.payment_provider.clone(),
            self.portal_return_url.clone(),
        )
    }

    pub fn subscription_status_handler(&self) -> GetSubscriptionStatusHandler {
        GetSubscriptionStatusHandler::new(self.users.clone(), self.payment_provider.clone())
    }

    pub fn cancel_subscription_handler(&self) -> CancelSubscriptionHandler {
        CancelSubscriptionHandler::new(self.payment_provider.clone())
    }

    pub fn webhook_processor(&self) -> IdempotentWebhookProcessor {
        IdempotentWebhookProcessor::new(
            self.processed_events.clone(),
            reconciliation_router(
                self.users.clone(),
                self.programs.clone(),
                self.catalog.clone(),
            ),
        )
    }

    pub fn metrics_aggregator(&self) -> MetricsAggregator {
        MetricsAggregator::new(
            self.payment_provider.clone(),
            self.users.clone(),
            self.catalog.clone(),
        )
    }
}

/// Error body shape shared by every endpoint: `{"error": "<message>"}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// 405 response for wrong-method calls on a known path.
pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody::new("Method not allowed")),
    )
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// The full API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(billing::routes())
        .merge(metrics::routes())
        .route("/healthz", get(health))
}
