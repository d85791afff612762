/// Error types for Blog Service
///
/// Every failure a handler can surface is an `AppError`. The `ResponseError`
/// implementation hands each variant to the presentation boundary, so handlers
/// just return `Result<HttpResponse>` and use `?`.
use actix_web::{error::ResponseError, http::header, http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::presentation::{self, View};

/// Result type for blog-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    /// Unknown group slug, username or post id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Mutation attempted without an authenticated actor.
    /// Carries the login location including the `next` continuation.
    #[error("Authentication required")]
    AuthenticationRequired { location: String },

    #[error("CSRF verification failed: {0}")]
    CsrfFailure(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Persistence is temporarily unreachable; safe to retry.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Unavailable(_))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::Unavailable(err.to_string())
            }
            other => AppError::Database(other),
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Cache(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AuthenticationRequired { .. } => StatusCode::FOUND,
            AppError::CsrfFailure(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) | AppError::Cache(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            AppError::NotFound(what) => presentation::render_with_status(
                View::NotFound,
                status,
                serde_json::json!({ "detail": what }),
            ),
            AppError::AuthenticationRequired { location } => presentation::redirect(location),
            AppError::CsrfFailure(reason) => {
                tracing::warn!(reason = %reason, "CSRF verification failed");
                presentation::render_with_status(
                    View::CsrfFailure,
                    status,
                    serde_json::json!({ "reason": reason }),
                )
            }
            AppError::BadRequest(msg) => presentation::render_with_status(
                View::BadRequest,
                status,
                serde_json::json!({ "error": msg }),
            ),
            AppError::Unavailable(msg) => {
                tracing::error!(error = %msg, "persistence unavailable");
                let mut resp = presentation::render_with_status(
                    View::ServerError,
                    status,
                    serde_json::json!({ "retryable": true }),
                );
                resp.headers_mut()
                    .insert(header::RETRY_AFTER, header::HeaderValue::from_static("1"));
                resp
            }
            AppError::Database(_) | AppError::Cache(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                presentation::render_with_status(
                    View::ServerError,
                    status,
                    serde_json::json!({ "retryable": false }),
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_is_retryable() {
        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn missing_row_is_a_plain_database_failure() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert!(!err.is_retryable());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn authentication_required_redirects_to_login() {
        let err = AppError::AuthenticationRequired {
            location: "/auth/login/?next=/create/".to_string(),
        };
        let resp = err.error_response();
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "/auth/login/?next=/create/"
        );
    }

    #[test]
    fn unavailable_sets_retry_after() {
        let resp = AppError::Unavailable("pool timed out".into()).error_response();
        assert_eq!(resp.headers().get(header::RETRY_AFTER).unwrap(), "1");
    }
}
