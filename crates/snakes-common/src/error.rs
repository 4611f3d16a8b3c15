//! Centralized error types for the snakes service.
//!
//! Uses `thiserror` for ergonomic error definitions and provides HTTP-friendly
//! error variants that can be directly converted to API responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// A statement failed to execute: driver error, lost connection, timeout, or a
/// column the driver could not decode.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct QueryFailure {
    pub message: String,
    /// Engine-specific code (SQLSTATE or vendor code) when the driver reports one.
    pub code: Option<String>,
}

impl QueryFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }
}

impl From<sqlx::Error> for QueryFailure {
    fn from(err: sqlx::Error) -> Self {
        let code = match &err {
            sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
            _ => None,
        };
        Self {
            message: err.to_string(),
            code,
        }
    }
}

/// Errors a request handler can turn into a response.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // === Lookup misses ===
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    #[error("Not found")]
    RouteNotFound,

    // === Request errors ===
    #[error("Bad request")]
    BadRequest { message: String },

    // === Infrastructure errors ===
    #[error("Database query failed")]
    Query(#[from] QueryFailure),

    #[error("Internal server error")]
    Internal { message: String },
}

/// JSON error response body sent to clients.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ApiError {
    /// Map error to HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Query(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body for this error. Query failures carry the driver's message and code.
    pub fn body(&self) -> ErrorResponse {
        let (message, code) = match self {
            Self::Query(failure) => (Some(failure.message.clone()), failure.code.clone()),
            Self::Internal { message } | Self::BadRequest { message } => {
                (Some(message.clone()), None)
            }
            Self::NotFound { .. } | Self::RouteNotFound => (None, None),
        };
        ErrorResponse {
            error: self.to_string(),
            message,
            code,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            Self::Query(failure) => {
                tracing::error!(code = ?failure.code, "Database query failed: {failure}");
            }
            Self::Internal { message } => tracing::error!("Internal error: {message}"),
            Self::BadRequest { message } => tracing::debug!("Rejected request: {message}"),
            Self::NotFound { .. } | Self::RouteNotFound => {}
        }

        (status, axum::Json(self.body())).into_response()
    }
}

/// Convenience type alias for Results using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_not_found_body_is_bare() {
        let err = ApiError::NotFound { resource: "Snake" };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            serde_json::to_value(err.body()).unwrap(),
            json!({ "error": "Snake not found" })
        );
    }

    #[test]
    fn test_route_not_found_body() {
        assert_eq!(
            serde_json::to_value(ApiError::RouteNotFound.body()).unwrap(),
            json!({ "error": "Not found" })
        );
    }

    #[test]
    fn test_bad_request_body_has_message() {
        let err = ApiError::BadRequest {
            message: "Invalid UTF-8 in `id`".into(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            serde_json::to_value(err.body()).unwrap(),
            json!({ "error": "Bad request", "message": "Invalid UTF-8 in `id`" })
        );
    }

    #[test]
    fn test_query_failure_carries_message_and_code() {
        let err = ApiError::from(QueryFailure {
            message: "Table 'zoo.snakes' doesn't exist".into(),
            code: Some("42S02".into()),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            serde_json::to_value(err.body()).unwrap(),
            json!({
                "error": "Database query failed",
                "message": "Table 'zoo.snakes' doesn't exist",
                "code": "42S02",
            })
        );
    }

    #[test]
    fn test_query_failure_from_pool_timeout_has_no_code() {
        let failure = QueryFailure::from(sqlx::Error::PoolTimedOut);
        assert!(failure.code.is_none());
        assert!(!failure.message.is_empty());
    }

    #[tokio::test]
    async fn test_internal_is_500() {
        let response = ApiError::Internal {
            message: "boom".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
