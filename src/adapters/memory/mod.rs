//! In-memory document store adapters.
//!
//! Back the store ports with process-local maps for integration tests and
//! local development without a Firestore project. Semantics mirror the
//! Firestore adapter: updates never create documents, `save` on the event
//! store is check-and-insert.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::billing::{NewProgramPurchase, ProgramPurchase, UserAccount, UserUpdate};
use crate::domain::foundation::{DomainError, ProgramId, Timestamp, UserId};
use crate::ports::{
    ProcessedEvent, ProcessedEventStore, ProgramStore, SaveResult, UserStore,
};

/// In-memory `users` collection.
#[derive(Default)]
pub struct InMemoryUserStore {
    accounts: Mutex<HashMap<String, UserAccount>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a user document (test setup).
    pub fn insert(&self, account: UserAccount) {
        let id = account
            .id
            .as_ref()
            .expect("seeded account requires an id")
            .to_string();
        self.accounts.lock().unwrap().insert(id, account);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get(&self, id: &UserId) -> Result<Option<UserAccount>, DomainError> {
        Ok(self.accounts.lock().unwrap().get(id.as_str()).cloned())
    }

    async fn update(&self, id: &UserId, update: UserUpdate) -> Result<(), DomainError> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .get_mut(id.as_str())
            .ok_or_else(|| DomainError::user_not_found(id.as_str()))?;
        update.apply_to(account);
        Ok(())
    }

    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<UserAccount>, DomainError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| a.stripe_customer_id.as_deref() == Some(customer_id))
            .cloned())
    }

    async fn list(&self) -> Result<Vec<UserAccount>, DomainError> {
        Ok(self.accounts.lock().unwrap().values().cloned().collect())
    }
}

/// In-memory `training_programs` collection.
#[derive(Default)]
pub struct InMemoryProgramStore {
    purchases: Mutex<Vec<ProgramPurchase>>,
}

impl InMemoryProgramStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored purchases (test assertions).
    pub fn purchases(&self) -> Vec<ProgramPurchase> {
        self.purchases.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProgramStore for InMemoryProgramStore {
    async fn add(&self, purchase: NewProgramPurchase) -> Result<ProgramId, DomainError> {
        let id = ProgramId::generate();
        let now = Timestamp::now();
        self.purchases.lock().unwrap().push(ProgramPurchase {
            id: id.clone(),
            user_id: purchase.user_id.clone(),
            program: purchase.program_slug().to_string(),
            price: purchase.price_major(),
            currency: purchase.currency.clone(),
            purchase_date: purchase.purchase_date,
            is_active: true,
            stripe_payment_intent_id: purchase.payment_intent_id.clone(),
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<ProgramPurchase>, DomainError> {
        Ok(self
            .purchases
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.stripe_payment_intent_id == payment_intent_id)
            .cloned())
    }
}

/// In-memory processed-event dedup store.
#[derive(Default)]
pub struct InMemoryProcessedEventStore {
    records: Mutex<HashMap<String, ProcessedEvent>>,
}

impl InMemoryProcessedEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProcessedEventStore for InMemoryProcessedEventStore {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<ProcessedEvent>, DomainError> {
        Ok(self.records.lock().unwrap().get(event_id).cloned())
    }

    async fn save(&self, record: ProcessedEvent) -> Result<SaveResult, DomainError> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&record.event_id) {
            Ok(SaveResult::AlreadyExists)
        } else {
            records.insert(record.event_id.clone(), record);
            Ok(SaveResult::Inserted)
        }
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|_, r| r.processed_at >= cutoff);
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::{AccountStatus, Plan, UserUpdate};

    fn account(id: &str) -> UserAccount {
        UserAccount::with_id(UserId::new(id).unwrap())
    }

    #[tokio::test]
    async fn user_store_get_and_update() {
        let store = InMemoryUserStore::new();
        store.insert(account("user-1"));

        let user_id = UserId::new("user-1").unwrap();
        store
            .update(&user_id, UserUpdate::customer_id("cus_1"))
            .await
            .unwrap();

        let fetched = store.get(&user_id).await.unwrap().unwrap();
        assert_eq!(fetched.stripe_customer_id.as_deref(), Some("cus_1"));
        assert!(fetched.updated_at.is_some());
    }

    #[tokio::test]
    async fn user_store_update_missing_fails() {
        let store = InMemoryUserStore::new();
        let result = store
            .update(
                &UserId::new("ghost").unwrap(),
                UserUpdate::customer_id("cus_1"),
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn user_store_find_by_customer_id() {
        let store = InMemoryUserStore::new();
        let mut seeded = account("user-1");
        seeded.stripe_customer_id = Some("cus_7".to_string());
        store.insert(seeded);
        store.insert(account("user-2"));

        let found = store.find_by_customer_id("cus_7").await.unwrap().unwrap();
        assert_eq!(found.id.unwrap().as_str(), "user-1");
        assert!(store.find_by_customer_id("cus_8").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn program_store_assigns_distinct_ids() {
        let store = InMemoryProgramStore::new();
        let purchase = NewProgramPurchase {
            user_id: UserId::new("user-1").unwrap(),
            plan: Some(Plan::Summer),
            amount_minor: 60_000,
            currency: "usd".to_string(),
            purchase_date: Timestamp::now(),
            payment_intent_id: "pi_1".to_string(),
        };

        let id1 = store.add(purchase.clone()).await.unwrap();
        let id2 = store
            .add(NewProgramPurchase {
                payment_intent_id: "pi_2".to_string(),
                ..purchase
            })
            .await
            .unwrap();

        assert_ne!(id1, id2);
        assert_eq!(store.purchases().len(), 2);
    }

    #[tokio::test]
    async fn program_store_find_by_payment_intent() {
        let store = InMemoryProgramStore::new();
        store
            .add(NewProgramPurchase {
                user_id: UserId::new("user-1").unwrap(),
                plan: None,
                amount_minor: 100,
                currency: "usd".to_string(),
                purchase_date: Timestamp::now(),
                payment_intent_id: "pi_x".to_string(),
            })
            .await
            .unwrap();

        let found = store.find_by_payment_intent("pi_x").await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().program, "none");
        assert!(store.find_by_payment_intent("pi_y").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn event_store_first_writer_wins() {
        let store = InMemoryProcessedEventStore::new();
        let record = ProcessedEvent::success("evt_1", "payment_intent.succeeded");

        assert_eq!(
            store.save(record.clone()).await.unwrap(),
            SaveResult::Inserted
        );
        assert_eq!(store.save(record).await.unwrap(), SaveResult::AlreadyExists);
    }

    #[tokio::test]
    async fn event_store_retention_sweep() {
        let store = InMemoryProcessedEventStore::new();
        let mut old = ProcessedEvent::success("evt_old", "t");
        old.processed_at = Utc::now() - chrono::Duration::days(60);
        store.save(old).await.unwrap();
        store
            .save(ProcessedEvent::success("evt_new", "t"))
            .await
            .unwrap();

        let deleted = store
            .delete_before(Utc::now() - chrono::Duration::days(30))
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        assert!(store.find_by_event_id("evt_old").await.unwrap().is_none());
        assert!(store.find_by_event_id("evt_new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn account_status_survives_store_roundtrip() {
        let store = InMemoryUserStore::new();
        store.insert(account("user-1"));
        let user_id = UserId::new("user-1").unwrap();

        store
            .update(&user_id, UserUpdate::premium_until(Timestamp::now()))
            .await
            .unwrap();
        assert_eq!(
            store.get(&user_id).await.unwrap().unwrap().status,
            AccountStatus::Premium
        );

        store
            .update(&user_id, UserUpdate::premium_revoked())
            .await
            .unwrap();
        let account = store.get(&user_id).await.unwrap().unwrap();
        assert_eq!(account.status, AccountStatus::Free);
        assert!(account.premium_expires_at.is_none());
    }
}
