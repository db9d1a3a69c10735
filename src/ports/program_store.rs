//! ProgramStore port - the `training_programs` collection.

use async_trait::async_trait;

use crate::domain::billing::{NewProgramPurchase, ProgramPurchase};
use crate::domain::foundation::{DomainError, ProgramId};

/// Port over program purchase documents.
#[async_trait]
pub trait ProgramStore: Send + Sync {
    /// Insert a new purchase and return the store-assigned document id.
    async fn add(&self, purchase: NewProgramPurchase) -> Result<ProgramId, DomainError>;

    /// Find a purchase by its originating payment intent id.
    ///
    /// Used as a second idempotency guard: even across distinct event
    /// deliveries, one payment intent yields at most one purchase record.
    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<ProgramPurchase>, DomainError>;
}
