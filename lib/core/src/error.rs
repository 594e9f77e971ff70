use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

// ── Error codes ─────────────────────────────────────────────────────
//
// Stable, machine-readable identifiers. Clients match on these —
// never on the human-readable message string.

/// Stable error code constants.
///
/// Clients should match on `code` from `{"code": "NOT_FOUND", "message": "..."}`.
/// Codes never change; messages may be reworded.
pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const INVALID_TRANSITION: &str = "INVALID_TRANSITION";
    pub const ARCHIVE_BLOCKED: &str = "ARCHIVE_BLOCKED";
    pub const SEQUENCE_CONFLICT: &str = "SEQUENCE_CONFLICT";
    pub const TOO_MANY_ATTEMPTS: &str = "TOO_MANY_ATTEMPTS";
    pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const UPLOAD_ERROR: &str = "UPLOAD_ERROR";
    pub const INTERNAL: &str = "INTERNAL";
}

// ── ServiceError ────────────────────────────────────────────────────

/// Unified service error type used across all modules.
///
/// Each variant maps to a stable error code (see [`error_code`]) and an
/// HTTP status code. The JSON response always includes both:
///
/// ```json
/// {"code": "INVALID_TRANSITION", "message": "ticket t1: COMPLETED -> IN_PROGRESS"}
/// ```
///
/// Throttle variants additionally carry structured fields the UI needs
/// (`retryAfter` seconds, `remainingAttempts`).
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Resource does not exist. HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// Input data is missing or invalid. HTTP 400. No store mutation occurred.
    #[error("{0}")]
    Validation(String),

    /// Requested status change is not permitted from the current state.
    /// HTTP 409. Entity unchanged.
    #[error("{0}")]
    InvalidTransition(String),

    /// Archiving refused because the ticket is in progress or on hold.
    /// HTTP 409. Entity unchanged.
    #[error("{0}")]
    ArchiveBlocked(String),

    /// Two concurrent sequence reservations collided and the retry also
    /// failed. HTTP 409.
    #[error("{0}")]
    SequenceConflict(String),

    /// Authentication is locked for this principal. HTTP 429.
    #[error("too many failed attempts, retry in {retry_after_secs}s")]
    TooManyAttempts { retry_after_secs: u64 },

    /// Credential verification failed. HTTP 401.
    #[error("invalid credentials")]
    InvalidCredentials {
        remaining_attempts: u32,
        /// Set when this failure was the one that triggered the lockout.
        retry_after_secs: Option<u64>,
    },

    /// Missing or invalid authentication token. HTTP 401.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but lacks required permission. HTTP 403.
    #[error("{0}")]
    PermissionDenied(String),

    /// Storage backend failure. HTTP 500. No partial writes retained.
    #[error("{0}")]
    Storage(String),

    /// Attachment/blob storage failure. HTTP 500.
    #[error("{0}")]
    Upload(String),

    /// Unexpected internal error. HTTP 500.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => error_code::NOT_FOUND,
            ServiceError::Validation(_) => error_code::VALIDATION_FAILED,
            ServiceError::InvalidTransition(_) => error_code::INVALID_TRANSITION,
            ServiceError::ArchiveBlocked(_) => error_code::ARCHIVE_BLOCKED,
            ServiceError::SequenceConflict(_) => error_code::SEQUENCE_CONFLICT,
            ServiceError::TooManyAttempts { .. } => error_code::TOO_MANY_ATTEMPTS,
            ServiceError::InvalidCredentials { .. } => error_code::INVALID_CREDENTIALS,
            ServiceError::Unauthorized(_) => error_code::UNAUTHENTICATED,
            ServiceError::PermissionDenied(_) => error_code::PERMISSION_DENIED,
            ServiceError::Storage(_) => error_code::STORAGE_ERROR,
            ServiceError::Upload(_) => error_code::UPLOAD_ERROR,
            ServiceError::Internal(_) => error_code::INTERNAL,
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::InvalidTransition(_) => StatusCode::CONFLICT,
            ServiceError::ArchiveBlocked(_) => StatusCode::CONFLICT,
            ServiceError::SequenceConflict(_) => StatusCode::CONFLICT,
            ServiceError::TooManyAttempts { .. } => StatusCode::TOO_MANY_REQUESTS,
            ServiceError::InvalidCredentials { .. } => StatusCode::UNAUTHORIZED,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Upload(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
        });
        match &self {
            ServiceError::TooManyAttempts { retry_after_secs } => {
                body["retryAfter"] = serde_json::json!(retry_after_secs);
            }
            ServiceError::InvalidCredentials {
                remaining_attempts,
                retry_after_secs,
            } => {
                body["remainingAttempts"] = serde_json::json!(remaining_attempts);
                if let Some(secs) = retry_after_secs {
                    body["retryAfter"] = serde_json::json!(secs);
                }
            }
            _ => {}
        }
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_mapping() {
        assert_eq!(ServiceError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ServiceError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ServiceError::InvalidTransition("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(ServiceError::ArchiveBlocked("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(ServiceError::SequenceConflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ServiceError::TooManyAttempts { retry_after_secs: 60 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ServiceError::InvalidCredentials { remaining_attempts: 2, retry_after_secs: None }
                .status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ServiceError::Storage("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ServiceError::Upload("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_code_mapping() {
        assert_eq!(ServiceError::Validation("x".into()).error_code(), "VALIDATION_FAILED");
        assert_eq!(ServiceError::InvalidTransition("x".into()).error_code(), "INVALID_TRANSITION");
        assert_eq!(ServiceError::ArchiveBlocked("x".into()).error_code(), "ARCHIVE_BLOCKED");
        assert_eq!(ServiceError::SequenceConflict("x".into()).error_code(), "SEQUENCE_CONFLICT");
        assert_eq!(
            ServiceError::TooManyAttempts { retry_after_secs: 50 }.error_code(),
            "TOO_MANY_ATTEMPTS"
        );
        assert_eq!(
            ServiceError::InvalidCredentials { remaining_attempts: 0, retry_after_secs: Some(60) }
                .error_code(),
            "INVALID_CREDENTIALS"
        );
    }

    #[test]
    fn lockout_message_carries_retry_after() {
        let err = ServiceError::TooManyAttempts { retry_after_secs: 42 };
        assert_eq!(err.to_string(), "too many failed attempts, retry in 42s");
    }

    #[test]
    fn json_response_status() {
        let err = ServiceError::NotFound("ticket 'abc' not found".into());
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = ServiceError::TooManyAttempts { retry_after_secs: 60 }.into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
