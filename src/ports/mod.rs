//! Ports - contracts with external collaborators.
//!
//! The payment provider and the document store are opaque services; these
//! traits define exactly what the core requires of them, and adapters supply
//! the wire implementations. Everything is dependency-injected so tests can
//! substitute fakes.

mod payment_provider;
mod processed_event_store;
mod program_store;
mod user_store;

pub use payment_provider::{
    CreateCustomerRequest, CreatePaymentIntentRequest, Customer, PaymentError, PaymentErrorCode,
    PaymentIntent, PaymentProvider, PaymentRecord, PaymentStatus, PortalSession, Price,
    Subscription, SubscriptionStatus,
};
pub use processed_event_store::{ProcessedEvent, ProcessedEventStore, SaveResult};
pub use program_store::ProgramStore;
pub use user_store::UserStore;
