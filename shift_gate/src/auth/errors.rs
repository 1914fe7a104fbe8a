//! Credential error types.

use thiserror::Error;

/// Credential store errors
///
/// A wrong secret is not an error: [`CredentialVerifier::verify`] reports it
/// as `Ok(false)`. These variants cover the cases where no answer could be
/// computed at all.
///
/// [`CredentialVerifier::verify`]: super::CredentialVerifier::verify
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Hashing the secret failed
    #[error("Credential hashing failed")]
    HashingFailed,

    /// Stored hash could not be parsed
    #[error("Stored credential hash is malformed")]
    MalformedHash,

    /// Hasher parameters rejected
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    /// Baseline session token could not be signed or decoded
    #[error("Session token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Result type for credential operations
pub type CredentialResult<T> = Result<T, CredentialError>;
