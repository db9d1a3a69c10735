//! Payment configuration (Stripe)

use serde::Deserialize;

use crate::domain::billing::VerificationMode;

use super::error::ValidationError;

/// Payment configuration (Stripe)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// Stripe API key
    pub stripe_api_key: String,

    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,

    /// Webhook signature verification mode.
    ///
    /// `strict` (default) rejects deliveries that fail verification with 400.
    /// `permissive` logs the failure and processes the raw payload anyway;
    /// only intended for test environments.
    #[serde(default)]
    pub webhook_verification: VerificationMode,

    /// Billing portal return URL handed to Stripe when the caller omits one
    #[serde(default = "default_portal_return_url")]
    pub portal_return_url: String,

    /// Stripe price ID for the winter training plan
    pub winter_price_id: Option<String>,

    /// Stripe price ID for the summer training plan
    pub summer_price_id: Option<String>,

    /// Stripe price ID for the bodybuilding training plan
    pub bodybuilding_price_id: Option<String>,
}

fn default_portal_return_url() -> String {
    "coachforge://settings".to_string()
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_live_")
    }

    /// Validate payment configuration
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }

        // Verify key prefixes for safety
        if !self.stripe_api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }

        // Fail-open verification must never reach production
        if production && self.webhook_verification == VerificationMode::Permissive {
            return Err(ValidationError::PermissiveVerificationInProduction);
        }

        Ok(())
    }
}
