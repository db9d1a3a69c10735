//! MetricsAggregator - one parameterized aggregation path for the metric
//! endpoints and the dashboard.
//!
//! Fetches payment records for the requested window and its preceding
//! comparison window, looks up refunds with bounded concurrency, and reduces
//! everything through the pure functions in `domain::metrics`. The dashboard
//! runs the metric groups concurrently and fails as a whole if any group
//! fails — no partial results.

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use thiserror::Error;

use crate::domain::billing::PlanCatalog;
use crate::domain::foundation::DomainError;
use crate::domain::metrics::{
    daily_revenue_series, reduce_customers, reduce_revenue, reduce_sales, reduce_transactions,
    CustomerMetrics, DailyRevenuePoint, MetricWindow, RevenueMetrics, SalesMetrics,
    TransactionMetrics,
};
use crate::ports::{PaymentError, PaymentProvider, PaymentRecord, UserStore};

/// Most payment records fetched per window (the provider's page cap).
pub const PAYMENT_PAGE_CAP: u32 = 100;

/// In-flight refund lookups; keeps the fan-out inside the provider's rate
/// limits.
const REFUND_LOOKUP_WIDTH: usize = 8;

/// Errors from metric aggregation. All of them surface as 500s.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Payment provider error: {0}")]
    Payment(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<PaymentError> for MetricsError {
    fn from(err: PaymentError) -> Self {
        MetricsError::Payment(err.to_string())
    }
}

impl From<DomainError> for MetricsError {
    fn from(err: DomainError) -> Self {
        MetricsError::Store(err.to_string())
    }
}

/// Combined dashboard payload.
#[derive(Debug, Clone)]
pub struct DashboardMetrics {
    pub revenue: RevenueMetrics,
    pub sales: SalesMetrics,
    pub transactions: TransactionMetrics,
    pub customers: CustomerMetrics,
    pub history: Vec<DailyRevenuePoint>,
}

pub struct MetricsAggregator {
    payment_provider: Arc<dyn PaymentProvider>,
    users: Arc<dyn UserStore>,
    catalog: Arc<PlanCatalog>,
}

impl MetricsAggregator {
    pub fn new(
        payment_provider: Arc<dyn PaymentProvider>,
        users: Arc<dyn UserStore>,
        catalog: Arc<PlanCatalog>,
    ) -> Self {
        Self {
            payment_provider,
            users,
            catalog,
        }
    }

    /// Revenue for the window: gross, net of refunds, average transaction
    /// value, and growth against the preceding window.
    pub async fn revenue(&self, window: &MetricWindow) -> Result<RevenueMetrics, MetricsError> {
        let (current, previous) = self.fetch_window_pair(window).await?;
        let refunded_minor = self.refunded_total(&current).await?;
        Ok(reduce_revenue(&current, refunded_minor, &previous))
    }

    /// Sales counts grouped by plan classification.
    pub async fn sales(&self, window: &MetricWindow) -> Result<SalesMetrics, MetricsError> {
        let (current, previous) = self.fetch_window_pair(window).await?;
        Ok(reduce_sales(&current, &previous, &self.catalog))
    }

    /// Transaction totals and success rate.
    pub async fn transactions(
        &self,
        window: &MetricWindow,
    ) -> Result<TransactionMetrics, MetricsError> {
        let current = self
            .payment_provider
            .list_payments(window, PAYMENT_PAGE_CAP)
            .await?;
        Ok(reduce_transactions(&current))
    }

    /// Customer counts from the document store.
    pub async fn customers(
        &self,
        window: &MetricWindow,
    ) -> Result<CustomerMetrics, MetricsError> {
        let users = self.users.list().await?;
        Ok(reduce_customers(&users, window))
    }

    /// Daily revenue series over the window.
    pub async fn history(
        &self,
        window: &MetricWindow,
    ) -> Result<Vec<DailyRevenuePoint>, MetricsError> {
        let current = self
            .payment_provider
            .list_payments(window, PAYMENT_PAGE_CAP)
            .await?;
        Ok(daily_revenue_series(window, &current))
    }

    /// The combined dashboard: every group plus the series, fetched
    /// concurrently, failing together.
    pub async fn dashboard(&self, window: &MetricWindow) -> Result<DashboardMetrics, MetricsError> {
        let (revenue, sales, transactions, customers, history) = tokio::try_join!(
            self.revenue(window),
            self.sales(window),
            self.transactions(window),
            self.customers(window),
            self.history(window),
        )?;

        Ok(DashboardMetrics {
            revenue,
            sales,
            transactions,
            customers,
            history,
        })
    }

    /// Fetches the window and its comparison window concurrently.
    async fn fetch_window_pair(
        &self,
        window: &MetricWindow,
    ) -> Result<(Vec<PaymentRecord>, Vec<PaymentRecord>), MetricsError> {
        let previous = window.previous();
        let (current, prior) = tokio::try_join!(
            self.payment_provider.list_payments(window, PAYMENT_PAGE_CAP),
            self.payment_provider
                .list_payments(&previous, PAYMENT_PAGE_CAP),
        )?;
        Ok((current, prior))
    }

    /// Sums refunded amounts over the succeeded records' charges, at most
    /// `REFUND_LOOKUP_WIDTH` lookups in flight.
    async fn refunded_total(&self, records: &[PaymentRecord]) -> Result<i64, MetricsError> {
        let charges: Vec<String> = records
            .iter()
            .filter(|r| r.status.is_succeeded())
            .filter_map(|r| r.latest_charge.clone())
            .collect();

        let provider = self.payment_provider.clone();
        let total = stream::iter(charges)
            .map(move |charge| {
                let provider = provider.clone();
                async move { provider.get_refunded_amount(&charge).await }
            })
            .buffer_unordered(REFUND_LOOKUP_WIDTH)
            .try_fold(0i64, |acc, refunded| async move { Ok(acc + refunded) })
            .await?;

        Ok(total)
    }
}
