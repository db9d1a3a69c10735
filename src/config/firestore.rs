//! Document store configuration (Firestore)

use serde::Deserialize;

use super::error::ValidationError;

/// Firestore configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FirestoreConfig {
    /// GCP project id owning the Firestore database
    pub project_id: String,

    /// OAuth bearer token for the Firestore REST API.
    ///
    /// Injected by the hosting environment (metadata server / workload
    /// identity); never logged.
    pub auth_token: String,

    /// Base URL for the Firestore REST API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

fn default_api_base_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

impl FirestoreConfig {
    /// Validate Firestore configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.project_id.is_empty() {
            return Err(ValidationError::MissingRequired("FIRESTORE_PROJECT_ID"));
        }
        if self
            .project_id
            .chars()
            .any(|c| !c.is_ascii_alphanumeric() && c != '-')
        {
            return Err(ValidationError::InvalidFirestoreProject);
        }
        if self.auth_token.is_empty() {
            return Err(ValidationError::MissingRequired("FIRESTORE_AUTH_TOKEN"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> FirestoreConfig {
        FirestoreConfig {
            project_id: "coach-forge-prod".to_string(),
            auth_token: "ya29.token".to_string(),
            api_base_url: default_api_base_url(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_missing_project_id() {
        let config = FirestoreConfig {
            project_id: String::new(),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_project_id_characters() {
        let config = FirestoreConfig {
            project_id: "bad project!".to_string(),
            ..valid_config()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidFirestoreProject)
        ));
    }

    #[test]
    fn test_missing_auth_token() {
        let config = FirestoreConfig {
            auth_token: String::new(),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }
}
