//! Database query timeout helpers
//!
//! Bounds lock waits inside the serialized operations so a stuck row lock
//! surfaces as a retryable conflict instead of an indefinite hang.

use crate::errors::AccessError;
use std::time::Duration;
use tokio::time::timeout;

/// Default timeout for a locking transaction (10 seconds)
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for timeout operations
#[derive(Debug, thiserror::Error)]
pub enum TimeoutError {
    /// Operation timed out
    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),

    /// Inner operation failed
    #[error(transparent)]
    Access(#[from] AccessError),
}

impl From<TimeoutError> for AccessError {
    fn from(err: TimeoutError) -> Self {
        match err {
            TimeoutError::Timeout(after) => {
                log::warn!("Lock wait exceeded {after:?}, reporting conflict");
                AccessError::Conflict
            }
            TimeoutError::Access(inner) => inner,
        }
    }
}

/// Result type for timeout operations
pub type TimeoutResult<T> = Result<T, TimeoutError>;

/// Execute an operation with timeout
///
/// # Arguments
///
/// * `duration` - Timeout duration
/// * `future` - Async operation to execute
pub async fn with_timeout<F, T, E>(duration: Duration, future: F) -> TimeoutResult<T>
where
    F: std::future::Future<Output = Result<T, E>>,
    E: Into<AccessError>,
{
    match timeout(duration, future).await {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(e)) => Err(TimeoutError::Access(e.into())),
        Err(_) => Err(TimeoutError::Timeout(duration)),
    }
}

/// Execute a locking transaction with the default transaction timeout
pub async fn with_transaction_timeout<F, T>(future: F) -> Result<T, AccessError>
where
    F: std::future::Future<Output = Result<T, AccessError>>,
{
    Ok(with_timeout(DEFAULT_TRANSACTION_TIMEOUT, future).await?)
}
