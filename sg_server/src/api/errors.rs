//! Mapping of admission-control errors onto HTTP responses.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use shift_gate::AccessError;

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

/// Handler error wrapping [`AccessError`]
#[derive(Debug)]
pub struct ApiError(pub AccessError);

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    /// HTTP status for the wrapped error
    ///
    /// Unknown identities and bad secrets share 401 so neither can be probed.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AccessError::InvalidCredential | AccessError::NotFound(_) | AccessError::Expired => {
                StatusCode::UNAUTHORIZED
            }
            AccessError::NoActiveShift
            | AccessError::CapacityExceeded { .. }
            | AccessError::Conflict
            | AccessError::ShiftAlreadyActive
            | AccessError::SessionClosed
            | AccessError::AlreadyEnded => StatusCode::CONFLICT,
            AccessError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AccessError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AccessError::DuplicateToken | AccessError::Credential(_) | AccessError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if self.0.is_fatal() {
            tracing::error!(error = %self.0, "Request failed");
        }

        // Unknown identities carry the credential code too, so the body is
        // identical to a wrong secret
        let code = match &self.0 {
            AccessError::NotFound(_) => AccessError::InvalidCredential.code(),
            other => other.code(),
        };
        let body = ErrorResponse {
            error: self.0.client_message(),
            code,
        };

        let mut response = (status, Json(body)).into_response();
        if let AccessError::RateLimited { retry_after_secs } = self.0 {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Handler result type
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError(AccessError::InvalidCredential).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError(AccessError::NotFound("staff member")).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError(AccessError::NoActiveShift).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError(AccessError::CapacityExceeded { max: 1 }).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError(AccessError::RateLimited {
                retry_after_secs: 60
            })
            .status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError(AccessError::InvalidInput("x".to_string())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError(AccessError::DuplicateToken).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = ApiError(AccessError::RateLimited {
            retry_after_secs: 900,
        })
        .into_response();
        assert_eq!(response.headers().get(RETRY_AFTER).unwrap(), "900");
    }
}
