use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Token signature mismatch")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Invalid signing secret")]
    InvalidSecret,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Invalid API Key")]
    InvalidApiKey,

    #[error("Invalid client credentials")]
    InvalidClientCredentials,
}
