//! Training plan classification.
//!
//! Maps opaque Stripe price ids to the training programs the app sells.
//! The mapping is part of the wire contract with the mobile client: plan
//! slugs are stored verbatim on user and purchase documents.

use std::collections::HashMap;

/// A training program tier sold as a one-time purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plan {
    Winter,
    Summer,
    Bodybuilding,
}

impl Plan {
    /// The slug stored on documents and shown in `trainingProgramStatus`.
    pub fn slug(&self) -> &'static str {
        match self {
            Plan::Winter => "winter",
            Plan::Summer => "summer",
            Plan::Bodybuilding => "bodybuilding",
        }
    }

    /// Human-readable name used in dashboard groupings.
    pub fn display_name(&self) -> &'static str {
        match self {
            Plan::Winter => "Winter Plan",
            Plan::Summer => "Summer Plan",
            Plan::Bodybuilding => "Body Building Plan",
        }
    }

    /// Parses a stored slug back into a plan.
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "winter" => Some(Plan::Winter),
            "summer" => Some(Plan::Summer),
            "bodybuilding" => Some(Plan::Bodybuilding),
            _ => None,
        }
    }
}

/// Display name used for price ids outside the catalog.
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// Price-id to plan lookup table.
///
/// Classification is total: ids outside the table classify as `None`, which
/// callers render as the `"none"` status slug or the "Unknown Product"
/// grouping depending on context.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    by_price_id: HashMap<String, Plan>,
}

impl PlanCatalog {
    /// Creates an empty catalog.
    pub fn empty() -> Self {
        Self {
            by_price_id: HashMap::new(),
        }
    }

    /// Registers a price id for a plan, replacing any previous mapping.
    pub fn with_price(mut self, price_id: impl Into<String>, plan: Plan) -> Self {
        self.by_price_id.insert(price_id.into(), plan);
        self
    }

    /// Builds the catalog from optional per-plan overrides, falling back to
    /// the dashboard-issued production price ids.
    pub fn from_overrides(
        winter: Option<String>,
        summer: Option<String>,
        bodybuilding: Option<String>,
    ) -> Self {
        Self::empty()
            .with_price(
                winter.unwrap_or_else(|| DEFAULT_WINTER_PRICE_ID.to_string()),
                Plan::Winter,
            )
            .with_price(
                summer.unwrap_or_else(|| DEFAULT_SUMMER_PRICE_ID.to_string()),
                Plan::Summer,
            )
            .with_price(
                bodybuilding.unwrap_or_else(|| DEFAULT_BODYBUILDING_PRICE_ID.to_string()),
                Plan::Bodybuilding,
            )
    }

    /// Classifies a price id. Total: unmapped ids yield `None`.
    pub fn classify(&self, price_id: &str) -> Option<Plan> {
        self.by_price_id.get(price_id).copied()
    }

    /// Dashboard grouping label for a price id.
    pub fn display_name_for(&self, price_id: &str) -> &'static str {
        self.classify(price_id)
            .map(|p| p.display_name())
            .unwrap_or(UNKNOWN_PRODUCT)
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::from_overrides(None, None, None)
    }
}

const DEFAULT_WINTER_PRICE_ID: &str = "price_1SGzgzBa6NGVc5lJvVOssWsG";
const DEFAULT_SUMMER_PRICE_ID: &str = "price_1SGzfcBa6NGVc5lJwmTNs2xk";
const DEFAULT_BODYBUILDING_PRICE_ID: &str = "price_1SHG5NBa6NGVc5lJdOEVEhZv";
