//! CreateCheckoutSessionHandler - starts a one-time purchase.
//!
//! Mirrors the mobile checkout flow: resolve the price, reuse or create the
//! provider customer, open a payment intent carrying `userId`/`priceId`
//! metadata (reconciliation depends on them), and remember the customer
//! reference on the user document.

use std::sync::Arc;

use crate::domain::billing::UserUpdate;
use crate::domain::foundation::UserId;
use crate::ports::{
    CreateCustomerRequest, CreatePaymentIntentRequest, Customer, PaymentProvider, UserStore,
};

use super::BillingError;

/// Command to create a checkout session.
#[derive(Debug, Clone)]
pub struct CreateCheckoutSessionCommand {
    pub price_id: String,
    pub user_id: String,
    pub customer_email: Option<String>,
}

/// Result handed back to the mobile client.
#[derive(Debug, Clone)]
pub struct CheckoutSessionCreated {
    pub client_secret: String,
    pub payment_intent_id: String,
    pub customer_id: Option<String>,
}

pub struct CreateCheckoutSessionHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    users: Arc<dyn UserStore>,
}

impl CreateCheckoutSessionHandler {
    pub fn new(payment_provider: Arc<dyn PaymentProvider>, users: Arc<dyn UserStore>) -> Self {
        Self {
            payment_provider,
            users,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateCheckoutSessionCommand,
    ) -> Result<CheckoutSessionCreated, BillingError> {
        if cmd.price_id.trim().is_empty() {
            return Err(BillingError::MissingField("priceId"));
        }
        let user_id =
            UserId::new(&cmd.user_id).map_err(|_| BillingError::MissingField("userId"))?;

        // Charge what the dashboard says the plan costs right now
        let price = self.payment_provider.get_price(&cmd.price_id).await?;

        let customer = match cmd.customer_email.as_deref().filter(|e| !e.is_empty()) {
            Some(email) => Some(self.resolve_customer(&user_id, email).await?),
            None => None,
        };

        let intent = self
            .payment_provider
            .create_payment_intent(CreatePaymentIntentRequest {
                amount: price.unit_amount,
                currency: price.currency,
                customer_id: customer.as_ref().map(|c| c.id.clone()),
                receipt_email: cmd.customer_email.clone(),
                user_id: user_id.clone(),
                price_id: cmd.price_id.clone(),
            })
            .await?;

        if let Some(customer) = &customer {
            self.users
                .update(&user_id, UserUpdate::customer_id(&customer.id))
                .await?;
            tracing::info!(
                user_id = %user_id,
                customer_id = %customer.id,
                "Stored customer reference during checkout"
            );
        }

        Ok(CheckoutSessionCreated {
            client_secret: intent.client_secret,
            payment_intent_id: intent.id,
            customer_id: customer.map(|c| c.id),
        })
    }

    async fn resolve_customer(
        &self,
        user_id: &UserId,
        email: &str,
    ) -> Result<Customer, BillingError> {
        if let Some(existing) = self.payment_provider.find_customer_by_email(email).await? {
            return Ok(existing);
        }
        Ok(self
            .payment_provider
            .create_customer(CreateCustomerRequest {
                user_id: user_id.clone(),
                email: email.to_string(),
            })
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryUserStore;
    use crate::application::handlers::billing::test_support::StubPaymentProvider;
    use crate::domain::billing::UserAccount;
    use crate::ports::Price;

    fn seeded_users() -> Arc<InMemoryUserStore> {
        let users = InMemoryUserStore::new();
        users.insert(UserAccount::with_id(UserId::new("user-1").unwrap()));
        Arc::new(users)
    }

    fn provider_with_price() -> StubPaymentProvider {
        StubPaymentProvider {
            price: Some(Price {
                id: "price_w".to_string(),
                unit_amount: 40_000,
                currency: "cad".to_string(),
            }),
            ..StubPaymentProvider::new()
        }
    }

    fn cmd(email: Option<&str>) -> CreateCheckoutSessionCommand {
        CreateCheckoutSessionCommand {
            price_id: "price_w".to_string(),
            user_id: "user-1".to_string(),
            customer_email: email.map(String::from),
        }
    }

    #[tokio::test]
    async fn creates_intent_with_price_amount_and_metadata() {
        let provider = Arc::new(provider_with_price());
        let handler = CreateCheckoutSessionHandler::new(provider.clone(), seeded_users());

        let result = handler.handle(cmd(None)).await.unwrap();

        assert_eq!(result.payment_intent_id, "pi_created");
        assert_eq!(result.client_secret, "pi_created_secret_abc");
        assert!(result.customer_id.is_none());

        let intents = provider.created_intents.lock().unwrap();
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].amount, 40_000);
        assert_eq!(intents[0].currency, "cad");
        assert_eq!(intents[0].price_id, "price_w");
        assert_eq!(intents[0].user_id.as_str(), "user-1");
    }

    #[tokio::test]
    async fn creates_customer_when_email_is_new() {
        let provider = Arc::new(provider_with_price());
        let users = seeded_users();
        let handler = CreateCheckoutSessionHandler::new(provider.clone(), users.clone());

        let result = handler.handle(cmd(Some("a@b.test"))).await.unwrap();

        assert_eq!(result.customer_id.as_deref(), Some("cus_created"));
        assert_eq!(provider.created_customers.lock().unwrap().len(), 1);

        // Customer reference was persisted onto the user document
        let account = users
            .get(&UserId::new("user-1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(account.stripe_customer_id.as_deref(), Some("cus_created"));
    }

    #[tokio::test]
    async fn reuses_existing_customer_for_known_email() {
        let provider = Arc::new(StubPaymentProvider {
            existing_customer: Some(crate::ports::Customer {
                id: "cus_existing".to_string(),
                email: Some("a@b.test".to_string()),
            }),
            ..provider_with_price()
        });
        let handler = CreateCheckoutSessionHandler::new(provider.clone(), seeded_users());

        let result = handler.handle(cmd(Some("a@b.test"))).await.unwrap();

        assert_eq!(result.customer_id.as_deref(), Some("cus_existing"));
        assert!(provider.created_customers.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_missing_price_id() {
        let handler =
            CreateCheckoutSessionHandler::new(Arc::new(provider_with_price()), seeded_users());

        let result = handler
            .handle(CreateCheckoutSessionCommand {
                price_id: "  ".to_string(),
                user_id: "user-1".to_string(),
                customer_email: None,
            })
            .await;

        assert!(matches!(result, Err(BillingError::MissingField("priceId"))));
    }

    #[tokio::test]
    async fn rejects_missing_user_id() {
        let handler =
            CreateCheckoutSessionHandler::new(Arc::new(provider_with_price()), seeded_users());

        let result = handler
            .handle(CreateCheckoutSessionCommand {
                price_id: "price_w".to_string(),
                user_id: String::new(),
                customer_email: None,
            })
            .await;

        assert!(matches!(result, Err(BillingError::MissingField("userId"))));
    }

    #[tokio::test]
    async fn unknown_price_surfaces_payment_error() {
        let handler = CreateCheckoutSessionHandler::new(
            Arc::new(StubPaymentProvider::new()),
            seeded_users(),
        );

        let result = handler.handle(cmd(None)).await;
        assert!(matches!(result, Err(BillingError::Payment(_))));
    }
}
