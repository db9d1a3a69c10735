//! HTTP handlers for the billing endpoints.

use axum::body::Bytes;
use axum::extract::{Json, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::application::handlers::billing::{
    BillingError, CancelSubscriptionCommand, CreateCheckoutSessionCommand,
    CreatePortalSessionCommand, GetSubscriptionStatusQuery,
};
use crate::domain::billing::{StripeEvent, VerificationMode};

use super::super::{AppState, ErrorBody};
use super::dto::{
    CancelSubscriptionRequest, CancelSubscriptionResponse, CheckoutSessionResponse,
    CreateCheckoutSessionRequest, CreatePortalSessionRequest, PortalSessionResponse,
    SubscriptionStatusParams, SubscriptionStatusResponse, WebhookAckResponse,
};

/// POST /createCheckoutSession
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Json(request): Json<CreateCheckoutSessionRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let result = state
        .checkout_handler()
        .handle(CreateCheckoutSessionCommand {
            price_id: request.price_id.unwrap_or_default(),
            user_id: request.user_id.unwrap_or_default(),
            customer_email: request.customer_email,
        })
        .await?;

    Ok(Json(CheckoutSessionResponse::from(result)))
}

/// POST /createPortalSession
pub async fn create_portal_session(
    State(state): State<AppState>,
    Json(request): Json<CreatePortalSessionRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let result = state
        .portal_handler()
        .handle(CreatePortalSessionCommand {
            customer_id: request.customer_id.unwrap_or_default(),
            return_url: request.return_url,
        })
        .await?;

    Ok(Json(PortalSessionResponse::from(result)))
}

/// GET /getSubscriptionStatus?userId=
pub async fn get_subscription_status(
    State(state): State<AppState>,
    Query(params): Query<SubscriptionStatusParams>,
) -> Result<impl IntoResponse, BillingApiError> {
    let view = state
        .subscription_status_handler()
        .handle(GetSubscriptionStatusQuery {
            user_id: params.user_id.unwrap_or_default(),
        })
        .await?;

    Ok(Json(SubscriptionStatusResponse::from(view)))
}

/// POST /cancelSubscription
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Json(request): Json<CancelSubscriptionRequest>,
) -> Result<impl IntoResponse, BillingApiError> {
    let result = state
        .cancel_subscription_handler()
        .handle(CancelSubscriptionCommand {
            subscription_id: request.subscription_id.unwrap_or_default(),
            immediately: request.immediately.unwrap_or(false),
        })
        .await?;

    Ok(Json(CancelSubscriptionResponse::from(result)))
}

/// POST /stripeWebhook
///
/// Verifies the delivery (strict mode rejects with 400), runs it through the
/// idempotent processor, and acknowledges with `{"received": true}` — also
/// for unknown event types and duplicate deliveries. Handler failures answer
/// 5xx so Stripe retries.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let event = match state.verifier.verify_and_parse(&body, signature) {
        Ok(event) => event,
        Err(err) if state.verifier.mode() == VerificationMode::Permissive => {
            tracing::warn!(
                error = %err,
                "Webhook verification failed; permissive mode processes the raw payload"
            );
            match serde_json::from_slice::<StripeEvent>(&body) {
                Ok(event) => event,
                Err(parse_err) => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(ErrorBody::new(format!("Invalid payload: {}", parse_err))),
                    )
                        .into_response();
                }
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "Rejected webhook delivery");
            return (err.status_code(), Json(ErrorBody::new(err.to_string()))).into_response();
        }
    };

    tracing::info!(event_id = %event.id, event_type = %event.event_type, "Received webhook event");

    match state.webhook_processor().process(event).await {
        Ok(_) => (StatusCode::OK, Json(WebhookAckResponse { received: true })).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Webhook processing failed");
            (err.status_code(), Json(ErrorBody::new(err.to_string()))).into_response()
        }
    }
}

/// Converts billing errors into the `{"error": ...}` contract.
pub struct BillingApiError(BillingError);

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            BillingError::MissingField(_) => StatusCode::BAD_REQUEST,
            BillingError::UserNotFound => StatusCode::NOT_FOUND,
            BillingError::Payment(_) | BillingError::Store(_) => {
                tracing::error!(error = %self.0, "Billing endpoint failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorBody::new(self.0.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_field_maps_to_400_error_body() {
        let response = BillingApiError(BillingError::MissingField("priceId")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "Missing priceId"})
        );
    }

    #[tokio::test]
    async fn user_not_found_maps_to_404() {
        let response = BillingApiError(BillingError::UserNotFound).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn upstream_errors_map_to_500() {
        let response =
            BillingApiError(BillingError::Payment("stripe down".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"error": "stripe down"})
        );
    }
}
