//! Program purchase records (`training_programs` collection).

use crate::domain::foundation::{ProgramId, Timestamp, UserId};

use super::plan::Plan;

/// A purchased training program.
///
/// Created once per successful one-time payment and immutable afterwards
/// except for the `is_active` flag, which a future lifecycle job may clear.
/// Records are never deleted by this service.
#[derive(Debug, Clone)]
pub struct ProgramPurchase {
    pub id: ProgramId,
    pub user_id: UserId,
    /// Plan slug as classified at purchase time ("none" for unmapped prices).
    pub program: String,
    /// Price in major currency units.
    pub price: f64,
    pub currency: String,
    pub purchase_date: Timestamp,
    pub is_active: bool,
    pub stripe_payment_intent_id: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Data for a program purchase about to be inserted.
///
/// The store assigns the document id and stamps created/updated timestamps.
#[derive(Debug, Clone)]
pub struct NewProgramPurchase {
    pub user_id: UserId,
    pub plan: Option<Plan>,
    /// Amount in minor units as reported by the payment intent.
    pub amount_minor: i64,
    pub currency: String,
    pub purchase_date: Timestamp,
    pub payment_intent_id: String,
}

impl NewProgramPurchase {
    /// Plan slug stored on the document ("none" when unmapped).
    pub fn program_slug(&self) -> &str {
        self.plan.map(|p| p.slug()).unwrap_or("none")
    }

    /// Price converted from minor to major units.
    pub fn price_major(&self) -> f64 {
        self.amount_minor as f64 / 100.0
    }
}
