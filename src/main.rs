//! Service entry point: configuration, adapters, router, server.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use coach_forge::adapters::firestore::FirestoreDocumentStore;
use coach_forge::adapters::http::{api_router, AppState};
use coach_forge::adapters::stripe::{StripeConfig, StripePaymentAdapter};
use coach_forge::config::{AppConfig, ServerConfig};
use coach_forge::domain::billing::{PlanCatalog, StripeWebhookVerifier};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = build_state(&config);
    let app = api_router()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.server))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state);

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "coach-forge listening");

    axum::serve(listener, app).await?;
    Ok(())
}

fn build_state(config: &AppConfig) -> AppState {
    let stripe = Arc::new(StripePaymentAdapter::new(StripeConfig::new(
        config.payment.stripe_api_key.clone(),
    )));
    let firestore = Arc::new(FirestoreDocumentStore::new(&config.firestore));

    AppState {
        payment_provider: stripe,
        users: firestore.clone(),
        programs: firestore.clone(),
        processed_events: firestore,
        verifier: Arc::new(StripeWebhookVerifier::new(
            config.payment.stripe_webhook_secret.clone(),
            config.payment.webhook_verification,
        )),
        catalog: Arc::new(PlanCatalog::from_overrides(
            config.payment.winter_price_id.clone(),
            config.payment.summer_price_id.clone(),
            config.payment.bodybuilding_price_id.clone(),
        )),
        portal_return_url: config.payment.portal_return_url.clone(),
    }
}

/// Open CORS by default (the mobile client calls cross-origin); explicit
/// origins when configured.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
