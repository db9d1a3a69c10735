//! User account record as stored in the `users` collection.

use crate::domain::foundation::{ProgramId, Timestamp, UserId};

use super::plan::Plan;

/// Program/subscription status stored in `trainingProgramStatus`.
///
/// Transitions are driven exclusively by webhook reconciliation; the client
/// never infers them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountStatus {
    /// No program purchased and no subscription.
    None,
    /// Subscription lapsed or was cancelled.
    Free,
    /// Active premium subscription.
    Premium,
    /// A purchased one-time training plan.
    Plan(Plan),
    /// A status string written by an older revision we no longer recognize.
    /// Preserved verbatim so reconciliation never destroys information.
    Other(String),
}

impl AccountStatus {
    /// Stored string form of the status.
    pub fn as_str(&self) -> &str {
        match self {
            AccountStatus::None => "none",
            AccountStatus::Free => "free",
            AccountStatus::Premium => "premium",
            AccountStatus::Plan(plan) => plan.slug(),
            AccountStatus::Other(s) => s,
        }
    }

    /// Parses a stored status string.
    pub fn parse(value: &str) -> Self {
        match value {
            "none" => AccountStatus::None,
            "free" => AccountStatus::Free,
            "premium" => AccountStatus::Premium,
            other => match Plan::from_slug(other) {
                Some(plan) => AccountStatus::Plan(plan),
                None => AccountStatus::Other(other.to_string()),
            },
        }
    }

    /// Builds a status from a plan classification ("none" when unmapped).
    pub fn from_classification(plan: Option<Plan>) -> Self {
        match plan {
            Some(plan) => AccountStatus::Plan(plan),
            None => AccountStatus::None,
        }
    }

    /// Whether this status counts as an active customer for metrics:
    /// set, and neither `none` nor `free`.
    pub fn is_active(&self) -> bool {
        !matches!(self, AccountStatus::None | AccountStatus::Free)
    }
}

impl Default for AccountStatus {
    fn default() -> Self {
        AccountStatus::None
    }
}

/// A user document.
///
/// Field names on the wire (camelCase) are part of the contract with the
/// mobile client; the adapters preserve them byte-for-byte.
#[derive(Debug, Clone, Default)]
pub struct UserAccount {
    pub id: Option<UserId>,
    pub stripe_customer_id: Option<String>,
    pub status: AccountStatus,
    pub current_program_id: Option<ProgramId>,
    pub program_purchase_date: Option<Timestamp>,
    pub premium_expires_at: Option<Timestamp>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

impl UserAccount {
    /// Creates a bare account record with the given id.
    pub fn with_id(id: UserId) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }
}

/// A single optional field write.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    /// Leave the stored value untouched.
    Keep,
    /// Write the value.
    Set(T),
    /// Delete the field.
    Clear,
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Keep
    }
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }
}

/// Partial update of a user document.
///
/// Each set field is an independent, non-transactional write (last-write-wins
/// per field); `updatedAt` is stamped by the store on every update.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub stripe_customer_id: Patch<String>,
    pub status: Patch<AccountStatus>,
    pub current_program_id: Patch<ProgramId>,
    pub program_purchase_date: Patch<Timestamp>,
    pub premium_expires_at: Patch<Timestamp>,
}

impl UserUpdate {
    /// True when no field would be written.
    pub fn is_empty(&self) -> bool {
        self.stripe_customer_id.is_keep()
            && self.status.is_keep()
            && self.current_program_id.is_keep()
            && self.program_purchase_date.is_keep()
            && self.premium_expires_at.is_keep()
    }

    /// Update that records the Stripe customer reference.
    pub fn customer_id(customer_id: impl Into<String>) -> Self {
        Self {
            stripe_customer_id: Patch::Set(customer_id.into()),
            ..Default::default()
        }
    }

    /// Update applied after a successful one-time program purchase.
    pub fn program_purchased(
        status: AccountStatus,
        program_id: ProgramId,
        purchased_at: Timestamp,
    ) -> Self {
        Self {
            status: Patch::Set(status),
            current_program_id: Patch::Set(program_id),
            program_purchase_date: Patch::Set(purchased_at),
            ..Default::default()
        }
    }

    /// Update applied when a subscription grants or renews premium access.
    pub fn premium_until(expires_at: Timestamp) -> Self {
        Self {
            status: Patch::Set(AccountStatus::Premium),
            premium_expires_at: Patch::Set(expires_at),
            ..Default::default()
        }
    }

    /// Update applied when a subscription lapses or is deleted.
    pub fn premium_revoked() -> Self {
        Self {
            status: Patch::Set(AccountStatus::Free),
            premium_expires_at: Patch::Clear,
            ..Default::default()
        }
    }

    /// Applies this update to an in-memory account copy.
    pub fn apply_to(&self, account: &mut UserAccount) {
        match &self.stripe_customer_id {
            Patch::Set(v) => account.stripe_customer_id = Some(v.clone()),
            Patch::Clear => account.stripe_customer_id = None,
            Patch::Keep => {}
        }
        match &self.status {
            Patch::Set(v) => account.status = v.clone(),
            Patch::Clear => account.status = AccountStatus::None,
            Patch::Keep => {}
        }
        match &self.current_program_id {
            Patch::Set(v) => account.current_program_id = Some(v.clone()),
            Patch::Clear => account.current_program_id = None,
            Patch::Keep => {}
        }
        match &self.program_purchase_date {
            Patch::Set(v) => account.program_purchase_date = Some(*v),
            Patch::Clear => account.program_purchase_date = None,
            Patch::Keep => {}
        }
        match &self.premium_expires_at {
            Patch::Set(v) => account.premium_expires_at = Some(*v),
            Patch::Clear => account.premium_expires_at = None,
            Patch::Keep => {}
        }
        account.updated_at = Some(Timestamp::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_string_roundtrip() {
        for status in [
            AccountStatus::None,
            AccountStatus::Free,
            AccountStatus::Premium,
            AccountStatus::Plan(Plan::Winter),
        ] {
            assert_eq!(AccountStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn unrecognized_status_is_preserved() {
        let status = AccountStatus::parse("legacy-gold");
        assert_eq!(status, AccountStatus::Other("legacy-gold".to_string()));
        assert_eq!(status.as_str(), "legacy-gold");
        // Unknown statuses still count as active customers
        assert!(status.is_active());
    }

    #[test]
    fn active_excludes_none_and_free() {
        assert!(!AccountStatus::None.is_active());
        assert!(!AccountStatus::Free.is_active());
        assert!(AccountStatus::Premium.is_active());
        assert!(AccountStatus::Plan(Plan::Summer).is_active());
    }

    #[test]
    fn from_classification_maps_unmapped_to_none() {
        assert_eq!(
            AccountStatus::from_classification(None),
            AccountStatus::None
        );
        assert_eq!(
            AccountStatus::from_classification(Some(Plan::Winter)),
            AccountStatus::Plan(Plan::Winter)
        );
    }

    #[test]
    fn empty_update_writes_nothing() {
        assert!(UserUpdate::default().is_empty());
        assert!(!UserUpdate::customer_id("cus_1").is_empty());
    }

    #[test]
    fn premium_revoked_clears_expiry() {
        let mut account = UserAccount::default();
        account.premium_expires_at = Some(Timestamp::from_unix_secs(1_700_000_000));
        account.status = AccountStatus::Premium;

        UserUpdate::premium_revoked().apply_to(&mut account);

        assert_eq!(account.status, AccountStatus::Free);
        assert!(account.premium_expires_at.is_none());
        assert!(account.updated_at.is_some());
    }

    #[test]
    fn program_purchased_sets_reference_and_date() {
        let mut account = UserAccount::default();
        let program_id = ProgramId::generate();
        let purchased_at = Timestamp::from_unix_secs(1_700_000_000);

        UserUpdate::program_purchased(
            AccountStatus::Plan(Plan::Bodybuilding),
            program_id.clone(),
            purchased_at,
        )
        .apply_to(&mut account);

        assert_eq!(account.status, AccountStatus::Plan(Plan::Bodybuilding));
        assert_eq!(account.current_program_id, Some(program_id));
        assert_eq!(account.program_purchase_date, Some(purchased_at));
        // Customer id untouched
        assert!(account.stripe_customer_id.is_none());
    }
}
