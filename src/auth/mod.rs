pub mod errors;
pub mod password;
pub mod token;

pub use errors::AuthError;
pub use password::{hash_password, verify_password};
pub use token::{create_access_token, random_token, verify_access_token, Claims};

use tracing::warn;

/// Membership check against the configured allow-list
pub fn check_api_key(provided: Option<&str>, allowed: &[String]) -> Result<(), AuthError> {
    match provided {
        Some(key) if allowed.iter().any(|k| k == key) => Ok(()),
        Some(key) => {
            let shown: String = key.chars().take(5).collect();
            warn!("🔒 Invalid API key attempt: {}...", shown);
            Err(AuthError::InvalidApiKey)
        }
        None => Err(AuthError::InvalidApiKey),
    }
}

/// Identity of a desktop client
#[derive(Debug, Clone, PartialEq)]
pub struct ClientIdentity {
    pub id: String,
    pub name: String,
    pub kind: String,
}

/// Both headers must be present and non-empty; secrets are not checked against a registry
pub fn check_client_credentials(
    client_id: Option<&str>,
    client_secret: Option<&str>,
) -> Result<ClientIdentity, AuthError> {
    match (client_id, client_secret) {
        (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Ok(ClientIdentity {
            id: id.to_string(),
            name: "GamePath AI Desktop Client".to_string(),
            kind: "desktop".to_string(),
        }),
        _ => Err(AuthError::InvalidClientCredentials),
    }
}
