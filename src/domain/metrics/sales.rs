//! Sales metric reduction: succeeded payments grouped by plan.

use std::collections::BTreeMap;

use crate::domain::billing::PlanCatalog;
use crate::ports::PaymentRecord;

use super::growth_percent;
use super::revenue::succeeded_total_minor;

/// Sales summary for a window.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesMetrics {
    /// Count of succeeded payments.
    pub total_sales: u64,
    /// Value of succeeded payments, in major units.
    pub total_value: f64,
    /// Succeeded counts per plan display name. Unmapped price ids (and
    /// payments without one) group under "Unknown Product".
    pub by_plan: BTreeMap<String, u64>,
    /// Growth in sales count versus the preceding window, in percent.
    pub growth_percent: f64,
}

/// Reduces payment records into a sales summary using the plan catalog.
pub fn reduce_sales(
    current: &[PaymentRecord],
    previous: &[PaymentRecord],
    catalog: &PlanCatalog,
) -> SalesMetrics {
    let mut by_plan: BTreeMap<String, u64> = BTreeMap::new();
    let mut total_sales = 0u64;

    for record in current.iter().filter(|r| r.status.is_succeeded()) {
        total_sales += 1;
        let label = record
            .price_id
            .as_deref()
            .map(|id| catalog.display_name_for(id))
            .unwrap_or(crate::domain::billing::UNKNOWN_PRODUCT);
        *by_plan.entry(label.to_string()).or_insert(0) += 1;
    }

    let previous_sales = previous.iter().filter(|r| r.status.is_succeeded()).count() as u64;

    SalesMetrics {
        total_sales,
        total_value: succeeded_total_minor(current) as f64 / 100.0,
        by_plan,
        growth_percent: growth_percent(total_sales as f64, previous_sales as f64),
    }
}
