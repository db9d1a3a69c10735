//! Metric endpoint response bodies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::application::handlers::metrics::DashboardMetrics;
use crate::domain::metrics::{
    CustomerMetrics, DailyRevenuePoint, RevenueMetrics, SalesMetrics, TransactionMetrics,
};

/// `?startDate=YYYY-MM-DD&endDate=YYYY-MM-DD` (end exclusive).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricWindowParams {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueMetricsResponse {
    pub total_revenue: f64,
    pub net_revenue: f64,
    pub average_transaction_value: f64,
    pub growth_percent: f64,
}

impl From<RevenueMetrics> for RevenueMetricsResponse {
    fn from(metrics: RevenueMetrics) -> Self {
        Self {
            total_revenue: metrics.total,
            net_revenue: metrics.net,
            average_transaction_value: metrics.average_transaction_value,
            growth_percent: metrics.growth_percent,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesMetricsResponse {
    pub total_sales: u64,
    pub total_sales_value: f64,
    pub sales_by_plan: BTreeMap<String, u64>,
    pub growth_percent: f64,
}

impl From<SalesMetrics> for SalesMetricsResponse {
    fn from(metrics: SalesMetrics) -> Self {
        Self {
            total_sales: metrics.total_sales,
            total_sales_value: metrics.total_value,
            sales_by_plan: metrics.by_plan,
            growth_percent: metrics.growth_percent,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionMetricsResponse {
    pub total_transactions: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub success_rate: f64,
}

impl From<TransactionMetrics> for TransactionMetricsResponse {
    fn from(metrics: TransactionMetrics) -> Self {
        Self {
            total_transactions: metrics.total,
            succeeded: metrics.succeeded,
            failed: metrics.failed,
            success_rate: metrics.success_rate,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerMetricsResponse {
    pub active_customers: u64,
    pub new_customers: u64,
}

impl From<CustomerMetrics> for CustomerMetricsResponse {
    fn from(metrics: CustomerMetrics) -> Self {
        Self {
            active_customers: metrics.active,
            new_customers: metrics.new,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryPointResponse {
    /// ISO date (UTC day bucket).
    pub date: String,
    pub revenue: f64,
}

impl From<DailyRevenuePoint> for HistoryPointResponse {
    fn from(point: DailyRevenuePoint) -> Self {
        Self {
            date: point.date.format("%Y-%m-%d").to_string(),
            revenue: point.revenue,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetricsResponse {
    pub revenue: RevenueMetricsResponse,
    pub sales: SalesMetricsResponse,
    pub transactions: TransactionMetricsResponse,
    pub customers: CustomerMetricsResponse,
    pub history: Vec<HistoryPointResponse>,
}

impl From<DashboardMetrics> for DashboardMetricsResponse {
    fn from(metrics: DashboardMetrics) -> Self {
        Self {
            revenue: metrics.revenue.into(),
            sales: metrics.sales.into(),
            transactions: metrics.transactions.into(),
            customers: metrics.customers.into(),
            history: metrics.history.into_iter().map(Into::into).collect(),
        }
    }
}
