//! Billing domain: purchase state, webhook verification, and reconciliation.

mod plan;
mod program;
mod reconciliation;
mod stripe_event;
mod user_account;
mod webhook_errors;
mod webhook_processor;
mod webhook_verifier;

pub use plan::{Plan, PlanCatalog, UNKNOWN_PRODUCT};
pub use program::{NewProgramPurchase, ProgramPurchase};
pub use reconciliation::{
    reconciliation_router, CheckoutCompletedHandler, InvoicePaymentFailedHandler,
    InvoicePaymentSucceededHandler, PaymentIntentSucceededHandler, SubscriptionLifecycleHandler,
};
pub use stripe_event::{
    CheckoutSessionObject, InvoiceObject, PaymentIntentObject, StripeEvent, StripeEventData,
    StripeEventType, SubscriptionObject,
};
pub use user_account::{AccountStatus, Patch, UserAccount, UserUpdate};
pub use webhook_errors::WebhookError;
pub use webhook_processor::{
    EventRouter, IdempotentWebhookProcessor, ProcessOutcome, WebhookEventHandler,
};
pub use webhook_verifier::{StripeWebhookVerifier, VerificationMode};
