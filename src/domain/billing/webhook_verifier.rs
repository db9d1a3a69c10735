//! Stripe webhook signature verification.
//!
//! HMAC-SHA256 over `"{timestamp}.{body}"` with the signing secret, compared
//! in constant time, with a bounded timestamp window against replays.
//!
//! Verification behavior is governed by an explicit [`VerificationMode`]:
//! `Strict` rejects failed deliveries, `Permissive` reproduces the legacy
//! fail-open behavior (log and process the raw payload) and exists only for
//! test environments — configuration refuses it in production.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::stripe_event::StripeEvent;
use super::webhook_errors::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Maximum allowed age for webhook events (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// How verification failures are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMode {
    /// Reject deliveries that fail verification (default).
    #[default]
    Strict,
    /// Log the failure and process the parsed body anyway. Fail-open; test
    /// environments only.
    Permissive,
}

/// Parsed components of the `Stripe-Signature` header.
///
/// Format: `t=<timestamp>,v1=<hex signature>[,v0=<legacy>]`. Unknown keys are
/// skipped for forward compatibility; only `t` and `v1` are required.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SignatureHeader {
    timestamp: i64,
    v1_signature: Vec<u8>,
}

impl SignatureHeader {
    fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                return Err(WebhookError::ParseError(
                    "malformed signature header".to_string(),
                ));
            };
            match key {
                "t" => {
                    timestamp = Some(value.parse().map_err(|_| {
                        WebhookError::ParseError("invalid signature timestamp".to_string())
                    })?);
                }
                "v1" => {
                    v1_signature = Some(hex::decode(value).map_err(|_| {
                        WebhookError::ParseError("invalid v1 signature hex".to_string())
                    })?);
                }
                _ => {}
            }
        }

        Ok(SignatureHeader {
            timestamp: timestamp.ok_or_else(|| {
                WebhookError::ParseError("missing signature timestamp".to_string())
            })?,
            v1_signature: v1_signature
                .ok_or_else(|| WebhookError::ParseError("missing v1 signature".to_string()))?,
        })
    }
}

/// Verifier for Stripe webhook deliveries.
pub struct StripeWebhookVerifier {
    secret: SecretString,
    mode: VerificationMode,
}

impl StripeWebhookVerifier {
    /// Creates a verifier with the given signing secret and mode.
    pub fn new(secret: impl Into<String>, mode: VerificationMode) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
            mode,
        }
    }

    /// The configured verification mode.
    pub fn mode(&self) -> VerificationMode {
        self.mode
    }

    /// Verifies the delivery and parses the event.
    ///
    /// Steps: parse the header, validate the timestamp window, compute the
    /// expected HMAC, compare in constant time, parse the JSON payload.
    ///
    /// # Errors
    ///
    /// - `ParseError` — malformed header or payload
    /// - `TimestampOutOfRange` / `InvalidTimestamp` — replay window violation
    /// - `InvalidSignature` — HMAC mismatch
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;

        self.validate_timestamp(header.timestamp)?;

        let expected = self.compute_signature(header.timestamp, payload);
        if !constant_time_eq(&expected, &header.v1_signature) {
            return Err(WebhookError::InvalidSignature);
        }

        serde_json::from_slice(payload).map_err(|e| WebhookError::ParseError(e.to_string()))
    }

    fn validate_timestamp(&self, timestamp: i64) -> Result<(), WebhookError> {
        let age = chrono::Utc::now().timestamp() - timestamp;
        if age > MAX_EVENT_AGE_SECS {
            return Err(WebhookError::TimestampOutOfRange);
        }
        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(WebhookError::InvalidTimestamp);
        }
        Ok(())
    }

    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Constant-time comparison; length mismatch short-circuits, which leaks
/// only the signature length.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

/// Computes a valid hex signature for test fixtures.
#[cfg(test)]
pub fn sign_test_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}
