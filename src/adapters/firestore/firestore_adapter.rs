//! Firestore document store adapter.
//!
//! Implements the `UserStore`, `ProgramStore`, and `ProcessedEventStore`
//! ports over the Firestore REST API. Updates are field-level patches with
//! `updateMask`, matching the independent last-write-wins semantics the rest
//! of the system assumes; dedup inserts rely on the create precondition
//! (`documentId` POST returns 409 for an existing document).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::FirestoreConfig;
use crate::domain::billing::{
    AccountStatus, NewProgramPurchase, Patch, ProgramPurchase, UserAccount, UserUpdate,
};
use crate::domain::foundation::{DomainError, ProgramId, Timestamp, UserId};
use crate::ports::{
    ProcessedEvent, ProcessedEventStore, ProgramStore, SaveResult, UserStore,
};

use super::value::{
    bool_value, double_value, get_bool, get_f64, get_string, get_timestamp, string_value,
    timestamp_value, Fields,
};

const USERS_COLLECTION: &str = "users";
const PROGRAMS_COLLECTION: &str = "training_programs";
const PROCESSED_EVENTS_COLLECTION: &str = "processed_events";

/// Page size used when listing user documents.
const LIST_PAGE_SIZE: u32 = 300;

/// Firestore-backed document store.
pub struct FirestoreDocumentStore {
    documents_url: String,
    auth_token: SecretString,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Option<Fields>,
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    #[serde(default, rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<FirestoreDocument>,
}

impl FirestoreDocumentStore {
    pub fn new(config: &FirestoreConfig) -> Self {
        Self {
            documents_url: format!(
                "{}/projects/{}/databases/(default)/documents",
                config.api_base_url.trim_end_matches('/'),
                config.project_id
            ),
            auth_token: SecretString::new(config.auth_token.clone()),
            http_client: reqwest::Client::new(),
        }
    }

    fn doc_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}", self.documents_url, collection, id)
    }

    fn last_path_segment(name: &str) -> &str {
        name.rsplit('/').next().unwrap_or(name)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, DomainError> {
        request
            .bearer_auth(self.auth_token.expose_secret())
            .send()
            .await
            .map_err(|e| DomainError::external(format!("Firestore request failed: {}", e)))
    }

    async fn error_from(response: reqwest::Response) -> DomainError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::error!(status = %status, body = %body, "Firestore API error");
        DomainError::database(format!("Firestore error (HTTP {})", status))
    }

    async fn run_query(&self, structured_query: Value) -> Result<Vec<FirestoreDocument>, DomainError> {
        let url = format!("{}:runQuery", self.documents_url);
        let response = self
            .send(
                self.http_client
                    .post(&url)
                    .json(&json!({ "structuredQuery": structured_query })),
            )
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let items: Vec<RunQueryItem> = response
            .json()
            .await
            .map_err(|e| DomainError::serialization(e.to_string()))?;
        Ok(items.into_iter().filter_map(|i| i.document).collect())
    }

    fn field_equals_query(collection: &str, field: &str, value: &str) -> Value {
        json!({
            "from": [{ "collectionId": collection }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": field },
                    "op": "EQUAL",
                    "value": { "stringValue": value }
                }
            },
            "limit": 1
        })
    }

    // ── Document mapping ────────────────────────────────────────────

    fn decode_user(doc: FirestoreDocument) -> UserAccount {
        let fields = doc.fields.unwrap_or_default();
        let id = UserId::new(Self::last_path_segment(&doc.name)).ok();

        UserAccount {
            id,
            stripe_customer_id: get_string(&fields, "stripeCustomerId"),
            status: get_string(&fields, "trainingProgramStatus")
                .map(|s| AccountStatus::parse(&s))
                .unwrap_or_default(),
            current_program_id: get_string(&fields, "currentProgramId")
                .and_then(|s| ProgramId::new(s).ok()),
            program_purchase_date: get_timestamp(&fields, "programPurchaseDate"),
            premium_expires_at: get_timestamp(&fields, "premiumExpiresAt"),
            created_at: get_timestamp(&fields, "createdAt"),
            updated_at: get_timestamp(&fields, "updatedAt"),
        }
    }

    /// Builds the PATCH body fields and updateMask paths for a user update.
    ///
    /// Cleared fields appear in the mask but not the body, which deletes
    /// them; `updatedAt` is always stamped.
    fn encode_user_update(update: &UserUpdate) -> (Fields, Vec<&'static str>) {
        let mut fields = Fields::new();
        let mut mask: Vec<&'static str> = Vec::new();

        match &update.stripe_customer_id {
            Patch::Set(v) => {
                fields.insert("stripeCustomerId".to_string(), string_value(v.clone()));
                mask.push("stripeCustomerId");
            }
            Patch::Clear => mask.push("stripeCustomerId"),
            Patch::Keep => {}
        }
        match &update.status {
            Patch::Set(v) => {
                fields.insert(
                    "trainingProgramStatus".to_string(),
                    string_value(v.as_str()),
                );
                mask.push("trainingProgramStatus");
            }
            Patch::Clear => mask.push("trainingProgramStatus"),
            Patch::Keep => {}
        }
        match &update.current_program_id {
            Patch::Set(v) => {
                fields.insert("currentProgramId".to_string(), string_value(v.as_str()));
                mask.push("currentProgramId");
            }
            Patch::Clear => mask.push("currentProgramId"),
            Patch::Keep => {}
        }
        match &update.program_purchase_date {
            Patch::Set(v) => {
                fields.insert("programPurchaseDate".to_string(), timestamp_value(v));
                mask.push("programPurchaseDate");
            }
            Patch::Clear => mask.push("programPurchaseDate"),
            Patch::Keep => {}
        }
        match &update.premium_expires_at {
            Patch::Set(v) => {
                fields.insert("premiumExpiresAt".to_string(), timestamp_value(v));
                mask.push("premiumExpiresAt");
            }
            Patch::Clear => mask.push("premiumExpiresAt"),
            Patch::Keep => {}
        }

        fields.insert(
            "updatedAt".to_string(),
            timestamp_value(&Timestamp::now()),
        );
        mask.push("updatedAt");

        (fields, mask)
    }

    fn encode_program(purchase: &NewProgramPurchase) -> Fields {
        let now = Timestamp::now();
        let mut fields = Fields::new();
        fields.insert(
            "userId".to_string(),
            string_value(purchase.user_id.as_str()),
        );
        fields.insert(
            "program".to_string(),
            string_value(purchase.program_slug()),
        );
        fields.insert("price".to_string(), double_value(purchase.price_major()));
        fields.insert(
            "currency".to_string(),
            string_value(purchase.currency.clone()),
        );
        fields.insert(
            "purchaseDate".to_string(),
            timestamp_value(&purchase.purchase_date),
        );
        fields.insert("isActive".to_string(), bool_value(true));
        fields.insert(
            "stripePaymentIntentId".to_string(),
            string_value(purchase.payment_intent_id.clone()),
        );
        fields.insert("createdAt".to_string(), timestamp_value(&now));
        fields.insert("updatedAt".to_string(), timestamp_value(&now));
        fields
    }

    fn decode_program(doc: FirestoreDocument) -> Option<ProgramPurchase> {
        let fields = doc.fields.unwrap_or_default();
        Some(ProgramPurchase {
            id: ProgramId::new(Self::last_path_segment(&doc.name)).ok()?,
            user_id: UserId::new(get_string(&fields, "userId")?).ok()?,
            program: get_string(&fields, "program")?,
            price: get_f64(&fields, "price").unwrap_or(0.0),
            currency: get_string(&fields, "currency").unwrap_or_default(),
            purchase_date: get_timestamp(&fields, "purchaseDate")?,
            is_active: get_bool(&fields, "isActive").unwrap_or(false),
            stripe_payment_intent_id: get_string(&fields, "stripePaymentIntentId")?,
            created_at: get_timestamp(&fields, "createdAt").unwrap_or(Timestamp::default()),
            updated_at: get_timestamp(&fields, "updatedAt").unwrap_or(Timestamp::default()),
        })
    }

    fn encode_processed_event(record: &ProcessedEvent) -> Fields {
        let mut fields = Fields::new();
        fields.insert(
            "eventType".to_string(),
            string_value(record.event_type.clone()),
        );
        fields.insert(
            "processedAt".to_string(),
            timestamp_value(&Timestamp::from_datetime(record.processed_at)),
        );
        fields.insert("outcome".to_string(), string_value(record.outcome.clone()));
        if let Some(detail) = &record.detail {
            fields.insert("detail".to_string(), string_value(detail.clone()));
        }
        fields
    }

    fn decode_processed_event(doc: FirestoreDocument) -> ProcessedEvent {
        let event_id = Self::last_path_segment(&doc.name).to_string();
        let fields = doc.fields.unwrap_or_default();
        ProcessedEvent {
            event_id,
            event_type: get_string(&fields, "eventType").unwrap_or_default(),
            processed_at: get_timestamp(&fields, "processedAt")
                .map(|t| *t.as_datetime())
                .unwrap_or_else(Utc::now),
            outcome: get_string(&fields, "outcome").unwrap_or_default(),
            detail: get_string(&fields, "detail"),
        }
    }
}

#[async_trait]
impl UserStore for FirestoreDocumentStore {
    async fn get(&self, id: &UserId) -> Result<Option<UserAccount>, DomainError> {
        let response = self
            .send(self.http_client.get(self.doc_url(USERS_COLLECTION, id.as_str())))
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let doc: FirestoreDocument = response
            .json()
            .await
            .map_err(|e| DomainError::serialization(e.to_string()))?;
        Ok(Some(Self::decode_user(doc)))
    }

    async fn update(&self, id: &UserId, update: UserUpdate) -> Result<(), DomainError> {
        let (fields, mask) = Self::encode_user_update(&update);

        let mut query: Vec<(&str, String)> = mask
            .iter()
            .map(|path| ("updateMask.fieldPaths", path.to_string()))
            .collect();
        // Patch must not create the document; the app owns user creation
        query.push(("currentDocument.exists", "true".to_string()));

        let response = self
            .send(
                self.http_client
                    .patch(self.doc_url(USERS_COLLECTION, id.as_str()))
                    .query(&query)
                    .json(&json!({ "fields": fields })),
            )
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DomainError::user_not_found(id.as_str()));
        }
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(())
    }

    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<UserAccount>, DomainError> {
        let docs = self
            .run_query(Self::field_equals_query(
                USERS_COLLECTION,
                "stripeCustomerId",
                customer_id,
            ))
            .await?;
        Ok(docs.into_iter().next().map(Self::decode_user))
    }

    async fn list(&self) -> Result<Vec<UserAccount>, DomainError> {
        let url = format!("{}/{}", self.documents_url, USERS_COLLECTION);
        let mut users = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query: Vec<(&str, String)> =
                vec![("pageSize", LIST_PAGE_SIZE.to_string())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.clone()));
            }

            let response = self
                .send(self.http_client.get(&url).query(&query))
                .await?;
            if !response.status().is_success() {
                return Err(Self::error_from(response).await);
            }

            let page: DocumentList = response
                .json()
                .await
                .map_err(|e| DomainError::serialization(e.to_string()))?;
            users.extend(page.documents.into_iter().map(Self::decode_user));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(users)
    }
}

#[async_trait]
impl ProgramStore for FirestoreDocumentStore {
    async fn add(&self, purchase: NewProgramPurchase) -> Result<ProgramId, DomainError> {
        let url = format!("{}/{}", self.documents_url, PROGRAMS_COLLECTION);
        let fields = Self::encode_program(&purchase);

        let response = self
            .send(self.http_client.post(&url).json(&json!({ "fields": fields })))
            .await?;
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let doc: FirestoreDocument = response
            .json()
            .await
            .map_err(|e| DomainError::serialization(e.to_string()))?;
        ProgramId::new(Self::last_path_segment(&doc.name))
            .map_err(|e| DomainError::serialization(e.to_string()))
    }

    async fn find_by_payment_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<ProgramPurchase>, DomainError> {
        let docs = self
            .run_query(Self::field_equals_query(
                PROGRAMS_COLLECTION,
                "stripePaymentIntentId",
                payment_intent_id,
            ))
            .await?;
        Ok(docs.into_iter().next().and_then(Self::decode_program))
    }
}

#[async_trait]
impl ProcessedEventStore for FirestoreDocumentStore {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<ProcessedEvent>, DomainError> {
        let response = self
            .send(
                self.http_client
                    .get(self.doc_url(PROCESSED_EVENTS_COLLECTION, event_id)),
            )
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let doc: FirestoreDocument = response
            .json()
            .await
            .map_err(|e| DomainError::serialization(e.to_string()))?;
        Ok(Some(Self::decode_processed_event(doc)))
    }

    async fn save(&self, record: ProcessedEvent) -> Result<SaveResult, DomainError> {
        let url = format!("{}/{}", self.documents_url, PROCESSED_EVENTS_COLLECTION);
        let fields = Self::encode_processed_event(&record);

        let response = self
            .send(
                self.http_client
                    .post(&url)
                    .query(&[("documentId", record.event_id.as_str())])
                    .json(&json!({ "fields": fields })),
            )
            .await?;

        // Create with an explicit documentId races on the server; the loser
        // gets ALREADY_EXISTS
        if response.status() == reqwest::StatusCode::CONFLICT {
            return Ok(SaveResult::AlreadyExists);
        }
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(SaveResult::Inserted)
    }

    async fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DomainError> {
        let cutoff_ts = Timestamp::from_datetime(cutoff);
        let docs = self
            .run_query(json!({
                "from": [{ "collectionId": PROCESSED_EVENTS_COLLECTION }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "processedAt" },
                        "op": "LESS_THAN",
                        "value": { "timestampValue": cutoff_ts.to_rfc3339() }
                    }
                }
            }))
            .await?;

        let mut deleted = 0u64;
        for doc in docs {
            let id = Self::last_path_segment(&doc.name).to_string();
            let response = self
                .send(
                    self.http_client
                        .delete(self.doc_url(PROCESSED_EVENTS_COLLECTION, &id)),
                )
                .await?;
            if response.status().is_success() {
                deleted += 1;
            } else {
                tracing::warn!(event_id = %id, "Failed to delete processed event record");
            }
        }
        Ok(deleted)
    }
}
