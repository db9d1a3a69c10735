//! Reconciliation handlers: webhook events to document-store mutations.
//!
//! One handler per event family. Each is a mapping from the event payload to
//! field writes on the `users` and `training_programs` collections. Missing
//! references inside a payload (no user id, no matching customer) are logged
//! no-ops, not errors; store failures propagate so the delivery is retried.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{ProgramStore, UserStore};

use super::plan::PlanCatalog;
use super::program::NewProgramPurchase;
use super::stripe_event::{
    CheckoutSessionObject, InvoiceObject, PaymentIntentObject, StripeEvent, StripeEventType,
    SubscriptionObject,
};
use super::user_account::{AccountStatus, Patch, UserUpdate};
use super::webhook_errors::WebhookError;
use super::webhook_processor::{EventRouter, WebhookEventHandler};

/// Builds the event router with every reconciliation handler registered.
pub fn reconciliation_router(
    users: Arc<dyn UserStore>,
    programs: Arc<dyn ProgramStore>,
    catalog: Arc<PlanCatalog>,
) -> EventRouter {
    EventRouter::new(vec![
        Arc::new(CheckoutCompletedHandler {
            users: users.clone(),
        }),
        Arc::new(PaymentIntentSucceededHandler {
            users: users.clone(),
            programs,
            catalog,
        }),
        Arc::new(SubscriptionLifecycleHandler {
            users: users.clone(),
        }),
        Arc::new(InvoicePaymentSucceededHandler { users }),
        Arc::new(InvoicePaymentFailedHandler),
    ])
}

fn parse_object<T: serde::de::DeserializeOwned>(event: &StripeEvent) -> Result<T, WebhookError> {
    event
        .deserialize_object()
        .map_err(|e| WebhookError::ParseError(format!("{}: {}", event.event_type, e)))
}

/// Upserts the Stripe customer reference after checkout completes.
///
/// One-time purchases are finalized by `payment_intent.succeeded`; this
/// handler only records which provider customer the user maps to.
pub struct CheckoutCompletedHandler {
    users: Arc<dyn UserStore>,
}

#[async_trait]
impl WebhookEventHandler for CheckoutCompletedHandler {
    fn handles(&self) -> &'static [StripeEventType] {
        &[StripeEventType::CheckoutSessionCompleted]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let session: CheckoutSessionObject = parse_object(event)?;

        let Some(user_id) = session
            .client_reference_id
            .as_deref()
            .and_then(|id| UserId::new(id).ok())
        else {
            tracing::warn!(
                session_id = %session.id,
                "Checkout session without client_reference_id; nothing to reconcile"
            );
            return Ok(());
        };

        let update = match &session.customer {
            Some(customer_id) => UserUpdate::customer_id(customer_id),
            // Still touch the document so updatedAt reflects the checkout
            None => UserUpdate::default(),
        };

        self.users.update(&user_id, update).await?;

        tracing::info!(
            user_id = %user_id,
            customer_id = session.customer.as_deref().unwrap_or("-"),
            "Recorded checkout completion"
        );
        Ok(())
    }
}

/// Creates the program purchase record and flips the user's program status
/// after a successful one-time payment.
pub struct PaymentIntentSucceededHandler {
    users: Arc<dyn UserStore>,
    programs: Arc<dyn ProgramStore>,
    catalog: Arc<PlanCatalog>,
}

#[async_trait]
impl WebhookEventHandler for PaymentIntentSucceededHandler {
    fn handles(&self) -> &'static [StripeEventType] {
        &[StripeEventType::PaymentIntentSucceeded]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let intent: PaymentIntentObject = parse_object(event)?;

        let Some(user_id) = intent.user_id().and_then(|id| UserId::new(id).ok()) else {
            tracing::warn!(
                payment_intent = %intent.id,
                "Payment intent without userId metadata; skipping"
            );
            return Ok(());
        };

        // Guard against a second event carrying the same payment intent;
        // event-id dedup alone cannot catch that.
        if self
            .programs
            .find_by_payment_intent(&intent.id)
            .await?
            .is_some()
        {
            tracing::info!(
                payment_intent = %intent.id,
                "Purchase already recorded for this payment intent"
            );
            return Ok(());
        }

        let plan = intent.price_id().and_then(|id| self.catalog.classify(id));
        if plan.is_none() {
            tracing::warn!(
                payment_intent = %intent.id,
                price_id = intent.price_id().unwrap_or("-"),
                "Price id not in plan catalog; recording purchase as 'none'"
            );
        }

        let purchased_at = Timestamp::now();
        let purchase = NewProgramPurchase {
            user_id: user_id.clone(),
            plan,
            amount_minor: intent.amount,
            currency: intent.currency.clone(),
            purchase_date: purchased_at,
            payment_intent_id: intent.id.clone(),
        };

        let program_id = self.programs.add(purchase).await?;

        self.users
            .update(
                &user_id,
                UserUpdate::program_purchased(
                    AccountStatus::from_classification(plan),
                    program_id.clone(),
                    purchased_at,
                ),
            )
            .await?;

        tracing::info!(
            user_id = %user_id,
            program_id = %program_id,
            plan = plan.map(|p| p.slug()).unwrap_or("none"),
            "Recorded program purchase"
        );
        Ok(())
    }
}

/// Keeps premium status in sync with the subscription lifecycle.
pub struct SubscriptionLifecycleHandler {
    users: Arc<dyn UserStore>,
}

#[async_trait]
impl WebhookEventHandler for SubscriptionLifecycleHandler {
    fn handles(&self) -> &'static [StripeEventType] {
        &[
            StripeEventType::SubscriptionCreated,
            StripeEventType::SubscriptionUpdated,
            StripeEventType::SubscriptionDeleted,
        ]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let subscription: SubscriptionObject = parse_object(event)?;

        let Some(account) = self
            .users
            .find_by_customer_id(&subscription.customer)
            .await?
        else {
            tracing::warn!(
                customer_id = %subscription.customer,
                subscription_id = %subscription.id,
                "No user holds this customer reference; skipping"
            );
            return Ok(());
        };
        let Some(user_id) = account.id else {
            tracing::warn!(
                customer_id = %subscription.customer,
                "Matched user document has no id; skipping"
            );
            return Ok(());
        };

        let deleted = event.parsed_type() == StripeEventType::SubscriptionDeleted;
        let update = if deleted || !subscription.grants_premium() {
            UserUpdate::premium_revoked()
        } else {
            match subscription.current_period_end {
                Some(end) => UserUpdate::premium_until(Timestamp::from_unix_secs(end)),
                None => UserUpdate {
                    status: Patch::Set(AccountStatus::Premium),
                    ..Default::default()
                },
            }
        };

        self.users.update(&user_id, update).await?;

        tracing::info!(
            user_id = %user_id,
            subscription_id = %subscription.id,
            status = %subscription.status,
            deleted,
            "Reconciled subscription state"
        );
        Ok(())
    }
}

/// Extends premium expiry when a subscription invoice is paid.
///
/// Invoices without a subscription belong to one-time purchases, which the
/// payment-intent handler already covers; those are logged and left alone.
pub struct InvoicePaymentSucceededHandler {
    users: Arc<dyn UserStore>,
}

#[async_trait]
impl WebhookEventHandler for InvoicePaymentSucceededHandler {
    fn handles(&self) -> &'static [StripeEventType] {
        &[StripeEventType::InvoicePaymentSucceeded]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let invoice: InvoiceObject = parse_object(event)?;

        let (Some(customer_id), Some(_), Some(period_end)) = (
            invoice.customer.as_deref(),
            invoice.subscription.as_deref(),
            invoice.period_end,
        ) else {
            tracing::info!(
                invoice_id = %invoice.id,
                "Invoice not tied to a subscription period; nothing to extend"
            );
            return Ok(());
        };

        let Some(account) = self.users.find_by_customer_id(customer_id).await? else {
            tracing::warn!(
                customer_id = %customer_id,
                invoice_id = %invoice.id,
                "No user holds this customer reference; skipping"
            );
            return Ok(());
        };
        let Some(user_id) = account.id else {
            return Ok(());
        };

        self.users
            .update(
                &user_id,
                UserUpdate::premium_until(Timestamp::from_unix_secs(period_end)),
            )
            .await?;

        tracing::info!(
            user_id = %user_id,
            invoice_id = %invoice.id,
            "Extended premium expiry from paid invoice"
        );
        Ok(())
    }
}

/// Logs failed invoice payments. No state mutation yet; the user-facing
/// dunning notification lives in a separate service.
pub struct InvoicePaymentFailedHandler;

#[async_trait]
impl WebhookEventHandler for InvoicePaymentFailedHandler {
    fn handles(&self) -> &'static [StripeEventType] {
        &[StripeEventType::InvoicePaymentFailed]
    }

    async fn handle(&self, event: &StripeEvent) -> Result<(), WebhookError> {
        let invoice: InvoiceObject = parse_object(event)?;
        tracing::warn!(
            invoice_id = %invoice.id,
            customer_id = invoice.customer.as_deref().unwrap_or("-"),
            "Invoice payment failed"
        );
        Ok(())
    }
}
