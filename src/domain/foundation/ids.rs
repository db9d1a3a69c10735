//! Identifier value objects.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::ValidationError;

/// Opaque user identifier, assigned by the mobile app's auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a user id, rejecting empty or whitespace-only values.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::empty_field("userId"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a program purchase document.
///
/// Generated by the document store on insert (Firestore auto-id); the
/// in-memory adapter generates a UUID instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramId(String);

impl ProgramId {
    /// Wraps a store-assigned document id.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::empty_field("programId"));
        }
        Ok(Self(value))
    }

    /// Generates a fresh random id (in-memory adapter only).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_accepts_opaque_values() {
        let id = UserId::new("fbu_8f3kS0").unwrap();
        assert_eq!(id.as_str(), "fbu_8f3kS0");
    }

    #[test]
    fn user_id_rejects_empty() {
        assert!(UserId::new("").is_err());
        assert!(UserId::new("   ").is_err());
    }

    #[test]
    fn program_id_generate_is_unique() {
        assert_ne!(ProgramId::generate(), ProgramId::generate());
    }

    #[test]
    fn program_id_rejects_empty() {
        assert!(ProgramId::new("").is_err());
    }

    #[test]
    fn ids_serialize_transparently() {
        let id = UserId::new("user-1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"user-1\"");
    }
}
