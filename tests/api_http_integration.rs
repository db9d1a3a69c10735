//! Integration tests for the billing and metric HTTP endpoints.
//!
//! Exercises the wire contract end to end with in-memory stores and a
//! scripted payment provider: request/response field names, status codes,
//! and the metric formulas over seeded payment data.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use coach_forge::adapters::http::{api_router, AppState};
use coach_forge::adapters::memory::{
    InMemoryProcessedEventStore, InMemoryProgramStore, InMemoryUserStore,
};
use coach_forge::domain::billing::{
    AccountStatus, PlanCatalog, StripeWebhookVerifier, UserAccount, VerificationMode,
};
use coach_forge::domain::foundation::{Timestamp, UserId};
use coach_forge::domain::metrics::MetricWindow;
use coach_forge::ports::{
    CreateCustomerRequest, CreatePaymentIntentRequest, Customer, PaymentError, PaymentIntent,
    PaymentProvider, PaymentRecord, PaymentStatus, PortalSession, Price, Subscription,
    SubscriptionStatus,
};

const JAN_1: i64 = 1_704_067_200; // 2024-01-01T00:00:00Z
const DAY: i64 = 86_400;

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Scripted payment provider backed by fixed data.
#[derive(Default)]
struct ScriptedPaymentProvider {
    price: Option<Price>,
    subscriptions: Vec<Subscription>,
    payments: Vec<PaymentRecord>,
    refunded_by_charge: HashMap<String, i64>,
}

#[async_trait]
impl PaymentProvider for ScriptedPaymentProvider {
    async fn get_price(&self, price_id: &str) -> Result<Price, PaymentError> {
        self.price
            .clone()
            .ok_or_else(|| PaymentError::not_found(price_id))
    }

    async fn find_customer_by_email(
        &self,
        _email: &str,
    ) -> Result<Option<Customer>, PaymentError> {
        Ok(None)
    }

    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError> {
        Ok(Customer {
            id: "cus_it".to_string(),
            email: Some(request.email),
        })
    }

    async fn create_payment_intent(
        &self,
        _request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        Ok(PaymentIntent {
            id: "pi_it".to_string(),
            client_secret: "pi_it_secret_xyz".to_string(),
        })
    }

    async fn list_payments(
        &self,
        window: &MetricWindow,
        _limit: u32,
    ) -> Result<Vec<PaymentRecord>, PaymentError> {
        Ok(self
            .payments
            .iter()
            .filter(|p| window.contains(&p.created))
            .cloned()
            .collect())
    }

    async fn get_refunded_amount(&self, charge_id: &str) -> Result<i64, PaymentError> {
        Ok(self.refunded_by_charge.get(charge_id).copied().unwrap_or(0))
    }

    async fn list_subscriptions(
        &self,
        _customer_id: &str,
        limit: u32,
    ) -> Result<Vec<Subscription>, PaymentError> {
        Ok(self
            .subscriptions
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
        immediately: bool,
    ) -> Result<Subscription, PaymentError> {
        Ok(Subscription {
            id: subscription_id.to_string(),
            customer_id: "cus_it".to_string(),
            status: SubscriptionStatus::Canceled,
            current_period_end: Some(JAN_1 + 30 * DAY),
            cancel_at_period_end: !immediately,
            canceled_at: Some(JAN_1),
        })
    }

    async fn create_portal_session(
        &self,
        _customer_id: &str,
        return_url: &str,
    ) -> Result<PortalSession, PaymentError> {
        Ok(PortalSession {
            id: "bps_it".to_string(),
            url: format!("https://billing.stripe.com/p/session?r={}", return_url),
        })
    }
}

fn payment(id: &str, amount: i64, status: &str, created: i64, price_id: Option<&str>) -> PaymentRecord {
    PaymentRecord {
        id: id.to_string(),
        amount_minor: amount,
        currency: "usd".to_string(),
        status: PaymentStatus::parse(status),
        created: Timestamp::from_unix_secs(created),
        price_id: price_id.map(String::from),
        latest_charge: Some(format!("ch_{}", id)),
    }
}

fn state_with(provider: ScriptedPaymentProvider, users: Arc<InMemoryUserStore>) -> AppState {
    AppState {
        payment_provider: Arc::new(provider),
        users: users.clone(),
        programs: Arc::new(InMemoryProgramStore::new()),
        processed_events: Arc::new(InMemoryProcessedEventStore::new()),
        verifier: Arc::new(StripeWebhookVerifier::new(
            "whsec_it",
            VerificationMode::Strict,
        )),
        catalog: Arc::new(PlanCatalog::default()),
        portal_return_url: "coachforge://settings".to_string(),
    }
}

async fn send(state: AppState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(json_body) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = api_router().with_state(state).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn seeded_users() -> Arc<InMemoryUserStore> {
    let users = Arc::new(InMemoryUserStore::new());
    users.insert(UserAccount::with_id(UserId::new("user-1").unwrap()));
    users
}

// =============================================================================
// Billing endpoints
// =============================================================================

#[tokio::test]
async fn create_checkout_session_returns_contract_fields() {
    let provider = ScriptedPaymentProvider {
        price: Some(Price {
            id: "price_w".to_string(),
            unit_amount: 40_000,
            currency: "cad".to_string(),
        }),
        ..Default::default()
    };
    let state = state_with(provider, seeded_users());

    let (status, body) = send(
        state,
        "POST",
        "/createCheckoutSession",
        Some(json!({"priceId": "price_w", "userId": "user-1", "customerEmail": "a@b.test"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["clientSecret"], "pi_it_secret_xyz");
    assert_eq!(body["paymentIntentId"], "pi_it");
    assert_eq!(body["customerId"], "cus_it");
}

#[tokio::test]
async fn create_checkout_session_missing_fields_is_400() {
    let state = state_with(ScriptedPaymentProvider::default(), seeded_users());

    let (status, body) = send(
        state,
        "POST",
        "/createCheckoutSession",
        Some(json!({"userId": "user-1"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("priceId"));
}

#[tokio::test]
async fn create_checkout_session_wrong_method_is_405() {
    let state = state_with(ScriptedPaymentProvider::default(), seeded_users());

    let (status, body) = send(state, "GET", "/createCheckoutSession", None).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({"error": "Method not allowed"}));
}

#[tokio::test]
async fn create_portal_session_requires_customer_id() {
    let state = state_with(ScriptedPaymentProvider::default(), seeded_users());

    let (status, body) = send(state, "POST", "/createPortalSession", Some(json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("customerId"));
}

#[tokio::test]
async fn create_portal_session_returns_url() {
    let state = state_with(ScriptedPaymentProvider::default(), seeded_users());

    let (status, body) = send(
        state,
        "POST",
        "/createPortalSession",
        Some(json!({"customerId": "cus_it"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["url"].as_str().unwrap().starts_with("https://billing.stripe.com/"));
}

#[tokio::test]
async fn subscription_status_defaults_to_free() {
    let state = state_with(ScriptedPaymentProvider::default(), seeded_users());

    let (status, body) = send(state, "GET", "/getSubscriptionStatus?userId=user-1", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "subscriptionId": null,
            "customerId": null,
            "status": "free",
            "currentPeriodEnd": null,
            "cancelAtPeriodEnd": null,
            "canceledAt": null
        })
    );
}

#[tokio::test]
async fn subscription_status_unknown_user_is_404() {
    let state = state_with(ScriptedPaymentProvider::default(), seeded_users());

    let (status, _) = send(state, "GET", "/getSubscriptionStatus?userId=ghost", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn subscription_status_missing_user_id_is_400() {
    let state = state_with(ScriptedPaymentProvider::default(), seeded_users());

    let (status, _) = send(state, "GET", "/getSubscriptionStatus", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cancel_subscription_reports_cancelled_at() {
    let state = state_with(ScriptedPaymentProvider::default(), seeded_users());

    let (status, body) = send(
        state,
        "POST",
        "/cancelSubscription",
        Some(json!({"subscriptionId": "sub_1", "immediately": true})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cancelledAt"], "2024-01-01T00:00:00Z");
}

// =============================================================================
// Metric endpoints
// =============================================================================

fn metrics_provider() -> ScriptedPaymentProvider {
    ScriptedPaymentProvider {
        payments: vec![
            // Requested window: Jan 1-7
            payment("a", 5_000, "succeeded", JAN_1 + 3_600, Some("price_1SGzgzBa6NGVc5lJvVOssWsG")),
            payment("b", 5_000, "succeeded", JAN_1 + DAY, None),
            payment("c", 2_000, "requires_payment_method", JAN_1 + DAY, None),
            payment("d", 2_000, "processing", JAN_1 + 2 * DAY, None),
            // Preceding window
            payment("old", 5_000, "succeeded", JAN_1 - 2 * DAY, None),
        ],
        refunded_by_charge: [("ch_a".to_string(), 5_000)].into_iter().collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn revenue_metrics_compute_totals_net_and_growth() {
    let state = state_with(metrics_provider(), seeded_users());

    let (status, body) = send(
        state,
        "GET",
        "/getRevenueMetrics?startDate=2024-01-01&endDate=2024-01-08",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalRevenue"], 100.0);
    // Payment "a" fully refunded
    assert_eq!(body["netRevenue"], 50.0);
    assert_eq!(body["averageTransactionValue"], 50.0);
    assert_eq!(body["growthPercent"], 100.0);
}

#[tokio::test]
async fn sales_metrics_group_by_plan() {
    let state = state_with(metrics_provider(), seeded_users());

    let (status, body) = send(
        state,
        "GET",
        "/getSalesMetrics?startDate=2024-01-01&endDate=2024-01-08",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalSales"], 2);
    assert_eq!(body["totalSalesValue"], 100.0);
    assert_eq!(body["salesByPlan"]["Winter Plan"], 1);
    assert_eq!(body["salesByPlan"]["Unknown Product"], 1);
}

#[tokio::test]
async fn transaction_metrics_partition_statuses() {
    let state = state_with(metrics_provider(), seeded_users());

    let (status, body) = send(
        state,
        "GET",
        "/getTransactionMetrics?startDate=2024-01-01&endDate=2024-01-08",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalTransactions"], 4);
    assert_eq!(body["succeeded"], 2);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["successRate"], 50.0);
}

#[tokio::test]
async fn dashboard_metrics_combine_groups_and_history() {
    let users = seeded_users();
    let mut premium = UserAccount::with_id(UserId::new("user-2").unwrap());
    premium.status = AccountStatus::Premium;
    premium.created_at = Some(Timestamp::from_unix_secs(JAN_1 + DAY));
    users.insert(premium);

    let state = state_with(metrics_provider(), users);

    let (status, body) = send(
        state,
        "GET",
        "/getDashboardMetrics?startDate=2024-01-01&endDate=2024-01-08",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["revenue"]["totalRevenue"], 100.0);
    assert_eq!(body["sales"]["totalSales"], 2);
    assert_eq!(body["transactions"]["totalTransactions"], 4);
    assert_eq!(body["customers"]["activeCustomers"], 1);
    assert_eq!(body["customers"]["newCustomers"], 1);

    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 7);
    assert_eq!(history[0]["date"], "2024-01-01");
    assert_eq!(history[0]["revenue"], 50.0);
    assert_eq!(history[1]["revenue"], 50.0);
    assert_eq!(history[2]["revenue"], 0.0);
}

#[tokio::test]
async fn metrics_require_both_dates() {
    let state = state_with(ScriptedPaymentProvider::default(), seeded_users());

    let (status, body) = send(
        state,
        "GET",
        "/getRevenueMetrics?startDate=2024-01-01",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("endDate"));
}

#[tokio::test]
async fn metrics_reject_malformed_dates() {
    let state = state_with(ScriptedPaymentProvider::default(), seeded_users());

    let (status, _) = send(
        state,
        "GET",
        "/getRevenueMetrics?startDate=yesterday&endDate=2024-01-08",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
