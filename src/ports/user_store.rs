//! UserStore port - the `users` collection of the document store.

use async_trait::async_trait;

use crate::domain::billing::{UserAccount, UserUpdate};
use crate::domain::foundation::{DomainError, UserId};

/// Port over the user documents.
///
/// Updates are field-level patches with no transactional guarantees across
/// documents; concurrent writers interleave last-write-wins per field.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch a user document by id.
    async fn get(&self, id: &UserId) -> Result<Option<UserAccount>, DomainError>;

    /// Patch fields on an existing user document.
    ///
    /// Fails with `UserNotFound` when the document does not exist (updates
    /// never create documents — the app owns user creation).
    async fn update(&self, id: &UserId, update: UserUpdate) -> Result<(), DomainError>;

    /// Find the user holding the given Stripe customer reference.
    ///
    /// At most one match is expected; the first match is returned.
    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<UserAccount>, DomainError>;

    /// List all user documents (customer metric counts).
    async fn list(&self) -> Result<Vec<UserAccount>, DomainError>;
}
