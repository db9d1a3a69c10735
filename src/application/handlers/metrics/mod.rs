//! Metric aggregation handlers.

mod aggregate;

pub use aggregate::{
    DashboardMetrics, MetricsAggregator, MetricsError, PAYMENT_PAGE_CAP,
};
