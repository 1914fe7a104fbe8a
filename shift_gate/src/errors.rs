//! Error taxonomy shared by every admission-control component.

use thiserror::Error;

use crate::auth::CredentialError;

/// Access-control errors
///
/// Every variant except `Database` is a recoverable, typed outcome that the
/// boundary reports to the caller. `Database` is the only fatal class.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Wrong secret, wrong factor, or unknown identity at a login boundary
    #[error("Invalid credentials")]
    InvalidCredential,

    /// Unknown owner, staff member, session or shift
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Staff login attempted while the owner has no open shift
    #[error("No active shift")]
    NoActiveShift,

    /// The open shift already holds its maximum number of live staff sessions
    #[error("Shift capacity exceeded: {max} staff sessions allowed")]
    CapacityExceeded { max: u32 },

    /// Session or elevation is past its expiry
    #[error("Session expired")]
    Expired,

    /// Session was already ended; callers treat this as a no-op success
    #[error("Session already ended")]
    AlreadyEnded,

    /// Lost a race on capacity or shift end; the caller should retry
    #[error("Concurrent update conflict, please retry")]
    Conflict,

    /// Owner tried to open a second shift while one is active
    #[error("A shift is already active")]
    ShiftAlreadyActive,

    /// Activity update against a session that is no longer live
    #[error("Session is closed")]
    SessionClosed,

    /// Too many recent failed logins for this actor
    #[error("Too many failed attempts, retry in {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    /// Request payload failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Issued token collided with a stored one
    #[error("Duplicate session token")]
    DuplicateToken,

    /// Credential store or hashing failure (not a mismatch)
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AccessError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Unknown identities render exactly like wrong secrets so that callers
    /// cannot enumerate owners or staff members.
    pub fn client_message(&self) -> String {
        match self {
            AccessError::NotFound(_) | AccessError::InvalidCredential => {
                "Invalid credentials".to_string()
            }
            AccessError::Database(_) | AccessError::Credential(_) | AccessError::DuplicateToken => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Stable machine-readable code for the boundary
    pub fn code(&self) -> &'static str {
        match self {
            AccessError::InvalidCredential => "INVALID_CREDENTIAL",
            AccessError::NotFound(_) => "NOT_FOUND",
            AccessError::NoActiveShift => "NO_ACTIVE_SHIFT",
            AccessError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            AccessError::Expired => "EXPIRED",
            AccessError::AlreadyEnded => "ALREADY_ENDED",
            AccessError::Conflict => "CONFLICT",
            AccessError::ShiftAlreadyActive => "SHIFT_ALREADY_ACTIVE",
            AccessError::SessionClosed => "SESSION_CLOSED",
            AccessError::RateLimited { .. } => "RATE_LIMITED",
            AccessError::InvalidInput(_) => "INVALID_INPUT",
            AccessError::DuplicateToken | AccessError::Credential(_) | AccessError::Database(_) => {
                "INTERNAL"
            }
        }
    }

    /// Whether this error must surface as a server failure
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AccessError::Database(_) | AccessError::Credential(_) | AccessError::DuplicateToken
        )
    }
}

/// Result type for access-control operations
pub type AccessResult<T> = Result<T, AccessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_and_invalid_credential_render_identically() {
        assert_eq!(
            AccessError::NotFound("staff member").client_message(),
            AccessError::InvalidCredential.client_message()
        );
    }

    #[test]
    fn test_shift_errors_are_distinguishable() {
        let no_shift = AccessError::NoActiveShift;
        let full = AccessError::CapacityExceeded { max: 1 };
        assert_ne!(no_shift.client_message(), full.client_message());
        assert_eq!(no_shift.code(), "NO_ACTIVE_SHIFT");
        assert_eq!(full.code(), "CAPACITY_EXCEEDED");
    }

    #[test]
    fn test_database_errors_are_sanitized() {
        let err = AccessError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.is_fatal());
        assert!(!AccessError::Conflict.is_fatal());
    }
}
