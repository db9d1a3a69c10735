//! Billing route table.
//!
//! Paths match the original cloud-function URLs the mobile client calls.

use axum::routing::{get, post};
use axum::Router;

use super::super::{method_not_allowed, AppState};
use super::handlers::{
    cancel_subscription, create_checkout_session, create_portal_session,
    get_subscription_status, stripe_webhook,
};

/// Billing endpoints:
/// - `POST /createCheckoutSession` - start a one-time purchase
/// - `POST /createPortalSession` - open the billing portal
/// - `GET /getSubscriptionStatus` - subscription state for a user
/// - `POST /cancelSubscription` - cancel immediately or at period end
/// - `POST /stripeWebhook` - signed provider events (no client auth)
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/createCheckoutSession",
            post(create_checkout_session).fallback(method_not_allowed),
        )
        .route(
            "/createPortalSession",
            post(create_portal_session).fallback(method_not_allowed),
        )
        .route(
            "/getSubscriptionStatus",
            get(get_subscription_status).fallback(method_not_allowed),
        )
        .route(
            "/cancelSubscription",
            post(cancel_subscription).fallback(method_not_allowed),
        )
        .route(
            "/stripeWebhook",
            post(stripe_webhook).fallback(method_not_allowed),
        )
}
