//! Metric route table.

use axum::routing::get;
use axum::Router;

use super::super::{method_not_allowed, AppState};
use super::handlers::{
    get_dashboard_metrics, get_revenue_metrics, get_sales_metrics, get_transaction_metrics,
};

/// Dashboard metric endpoints, all `GET` with `startDate`/`endDate` params:
/// - `/getRevenueMetrics`
/// - `/getSalesMetrics`
/// - `/getTransactionMetrics`
/// - `/getDashboardMetrics` (combined, plus the daily series)
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/getRevenueMetrics",
            get(get_revenue_metrics).fallback(method_not_allowed),
        )
        .route(
            "/getSalesMetrics",
            get(get_sales_metrics).fallback(method_not_allowed),
        )
        .route(
            "/getTransactionMetrics",
            get(get_transaction_metrics).fallback(method_not_allowed),
        )
        .route(
            "/getDashboardMetrics",
            get(get_dashboard_metrics).fallback(method_not_allowed),
        )
}
