//! Unified error handling with Sentry integration.
//!
//! Provides the closed `ApiError` taxonomy shared by every service. Each
//! variant carries a stable wire code, so clients can discriminate on
//! `code` instead of parsing message strings. All route handlers return
//! `Result<T, ApiError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use bazaar_core::types::id::InvalidId;
use bazaar_core::{NumericError, RoleError, StatusError};

use crate::db::RepositoryError;

/// Application-level error type for all Bazaar services.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid session token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// CSRF token mismatch.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Malformed identifier or invalid input.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Fixed-window rate limit exceeded; carries the configured message.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Persistence-layer failure.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Stable wire code for this error kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::NotFound(_) => "NOT_FOUND",
            Self::RateLimited(_) => "RATE_LIMITED",
            Self::Database(_) | Self::Internal(_) => "INTERNAL",
        }
    }

    /// HTTP status for this error kind.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    status: &'static str,
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_owned(),
            Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::BadRequest(msg)
            | Self::NotFound(msg)
            | Self::RateLimited(msg) => msg.clone(),
        };

        let body = ErrorBody {
            status: "error",
            code: self.code(),
            message,
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("document not found".to_owned()),
            RepositoryError::Conflict(msg) => Self::BadRequest(msg),
            other => Self::Database(other),
        }
    }
}

impl From<InvalidId> for ApiError {
    fn from(err: InvalidId) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<NumericError> for ApiError {
    fn from(err: NumericError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<StatusError> for ApiError {
    fn from(err: StatusError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<RoleError> for ApiError {
    fn from(err: RoleError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            get_status(ApiError::Unauthorized("no session".to_owned())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(ApiError::Forbidden("csrf".to_owned())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(ApiError::BadRequest("bad id".to_owned())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ApiError::NotFound("store".to_owned())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(ApiError::RateLimited("slow down".to_owned())),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(ApiError::Internal("boom".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_stable_codes() {
        assert_eq!(ApiError::Unauthorized(String::new()).code(), "UNAUTHORIZED");
        assert_eq!(ApiError::Forbidden(String::new()).code(), "FORBIDDEN");
        assert_eq!(ApiError::BadRequest(String::new()).code(), "BAD_REQUEST");
        assert_eq!(ApiError::NotFound(String::new()).code(), "NOT_FOUND");
        assert_eq!(ApiError::RateLimited(String::new()).code(), "RATE_LIMITED");
        assert_eq!(ApiError::Internal(String::new()).code(), "INTERNAL");
    }

    #[test]
    fn test_repository_not_found_maps_to_404() {
        let err: ApiError = crate::db::RepositoryError::NotFound.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_message_not_leaked() {
        let response =
            ApiError::Internal("connection string with password".to_owned()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        // Body construction replaces the message before serialization; the
        // variant's Display output is only used for logging.
    }

    #[test]
    fn test_invalid_id_maps_to_400() {
        let err: ApiError = bazaar_core::StoreId::parse("nope").unwrap_err().into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "BAD_REQUEST");
    }
}
