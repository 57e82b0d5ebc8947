//! HTTP-facing error taxonomy.
//!
//! Every failure a handler can produce is an [`ApiError`]. Its
//! [`IntoResponse`] impl is the single place where errors become status
//! codes and JSON bodies:
//!
//! ```json
//! { "status": "error", "code": "not_connected", "message": "Database not connected" }
//! ```
//!
//! | Variant | Status | Code |
//! |---------|--------|------|
//! | `NotConnected` | 503 | `not_connected` |
//! | `NotFound` | 404 | `not_found` |
//! | `ConnectionFailed` | 500 | `connection_failed` |
//! | `Validation` | 400 | `bad_request` |
//! | `Timeout` | 408 | `timeout` |
//! | `Query` | 500 | `internal` |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No active database connection; the request never reached the store.
    #[error("Database not connected")]
    NotConnected,

    #[error("{0} not found")]
    NotFound(&'static str),

    /// A connect attempt failed. Carries the (redacted) driver message.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("{0}")]
    Validation(String),

    #[error("Query timed out after {0}s")]
    Timeout(u64),

    /// Backend failure while serving a request. Details are logged, not returned.
    #[error("Internal query error")]
    Query(#[source] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotConnected => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ConnectionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            ApiError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotConnected => "not_connected",
            ApiError::NotFound(_) => "not_found",
            ApiError::ConnectionFailed(_) => "connection_failed",
            ApiError::Validation(_) => "bad_request",
            ApiError::Timeout(_) => "timeout",
            ApiError::Query(_) => "internal",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Query(ref source) = self {
            tracing::error!(error = ?source, "query failed");
        }
        let body = ErrorBody {
            status: "error",
            code: self.code(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
