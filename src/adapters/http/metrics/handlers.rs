//! HTTP handlers for the metric endpoints.

use axum::extract::{Json, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;

use crate::application::handlers::metrics::MetricsError;
use crate::domain::metrics::MetricWindow;

use super::super::{AppState, ErrorBody};
use super::dto::{
    DashboardMetricsResponse, MetricWindowParams, RevenueMetricsResponse, SalesMetricsResponse,
    TransactionMetricsResponse,
};

/// GET /getRevenueMetrics
pub async fn get_revenue_metrics(
    State(state): State<AppState>,
    Query(params): Query<MetricWindowParams>,
) -> Result<impl IntoResponse, MetricsApiError> {
    let window = parse_window(&params)?;
    let metrics = state.metrics_aggregator().revenue(&window).await?;
    Ok(Json(RevenueMetricsResponse::from(metrics)))
}

/// GET /getSalesMetrics
pub async fn get_sales_metrics(
    State(state): State<AppState>,
    Query(params): Query<MetricWindowParams>,
) -> Result<impl IntoResponse, MetricsApiError> {
    let window = parse_window(&params)?;
    let metrics = state.metrics_aggregator().sales(&window).await?;
    Ok(Json(SalesMetricsResponse::from(metrics)))
}

/// GET /getTransactionMetrics
pub async fn get_transaction_metrics(
    State(state): State<AppState>,
    Query(params): Query<MetricWindowParams>,
) -> Result<impl IntoResponse, MetricsApiError> {
    let window = parse_window(&params)?;
    let metrics = state.metrics_aggregator().transactions(&window).await?;
    Ok(Json(TransactionMetricsResponse::from(metrics)))
}

/// GET /getDashboardMetrics - every group plus the daily series.
pub async fn get_dashboard_metrics(
    State(state): State<AppState>,
    Query(params): Query<MetricWindowParams>,
) -> Result<impl IntoResponse, MetricsApiError> {
    let window = parse_window(&params)?;
    let metrics = state.metrics_aggregator().dashboard(&window).await?;
    Ok(Json(DashboardMetricsResponse::from(metrics)))
}

/// Parses and validates the window query parameters.
fn parse_window(params: &MetricWindowParams) -> Result<MetricWindow, MetricsApiError> {
    let start = parse_date(params.start_date.as_deref(), "startDate")?;
    let end = parse_date(params.end_date.as_deref(), "endDate")?;
    MetricWindow::from_dates(start, end)
        .map_err(|e| MetricsApiError::BadRequest(e.to_string()))
}

fn parse_date(value: Option<&str>, name: &str) -> Result<NaiveDate, MetricsApiError> {
    let value = value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| MetricsApiError::BadRequest(format!("Missing {}", name)))?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| MetricsApiError::BadRequest(format!("Invalid {}: '{}'", name, value)))
}

/// Metric endpoint errors: 400 for bad windows, 500 for upstream failures.
#[derive(Debug)]
pub enum MetricsApiError {
    BadRequest(String),
    Upstream(MetricsError),
}

impl From<MetricsError> for MetricsApiError {
    fn from(err: MetricsError) -> Self {
        Self::Upstream(err)
    }
}

impl IntoResponse for MetricsApiError {
    fn into_response(self) -> Response {
        match self {
            MetricsApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody::new(message))).into_response()
            }
            MetricsApiError::Upstream(err) => {
                tracing::error!(error = %err, "Metric aggregation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody::new(err.to_string())),
                )
                    .into_response()
            }
        }
    }
}
