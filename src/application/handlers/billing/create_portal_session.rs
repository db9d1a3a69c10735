//! CreatePortalSessionHandler - opens the Stripe billing portal.

use std::sync::Arc;

use crate::ports::PaymentProvider;

use super::BillingError;

/// Command to create a billing portal session.
#[derive(Debug, Clone)]
pub struct CreatePortalSessionCommand {
    pub customer_id: String,
    pub return_url: Option<String>,
}

/// The portal URL to open in the app.
#[derive(Debug, Clone)]
pub struct PortalSessionCreated {
    pub url: String,
}

pub struct CreatePortalSessionHandler {
    payment_provider: Arc<dyn PaymentProvider>,
    /// Where the portal sends the user back when the caller omits a URL;
    /// defaults to the app's settings deep link.
    default_return_url: String,
}

impl CreatePortalSessionHandler {
    pub fn new(
        payment_provider: Arc<dyn PaymentProvider>,
        default_return_url: impl Into<String>,
    ) -> Self {
        Self {
            payment_provider,
            default_return_url: default_return_url.into(),
        }
    }

    pub async fn handle(
        &self,
        cmd: CreatePortalSessionCommand,
    ) -> Result<PortalSessionCreated, BillingError> {
        if cmd.customer_id.trim().is_empty() {
            return Err(BillingError::MissingField("customerId"));
        }

        let return_url = cmd
            .return_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(&self.default_return_url);

        let session = self
            .payment_provider
            .create_portal_session(&cmd.customer_id, return_url)
            .await?;

        Ok(PortalSessionCreated { url: session.url })
    }
}
