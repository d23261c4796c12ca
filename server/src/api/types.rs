//! Shared API types
//!
//! Error envelope used by every endpoint plus the mapping from store and
//! sync failures to HTTP status codes.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::data::StoreError;
use crate::domain::traces::{FetchError, SyncError};

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: String, message: String },
    Conflict { code: String, message: String },
    BadGateway { code: String, message: String },
    ServiceUnavailable { message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_gateway(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadGateway {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(message) => Self::bad_request("INVALID_REQUEST", message),
            StoreError::Query(err) => Self::bad_request("QUERY_FAILED", err.to_string()),
            e @ StoreError::TableNotEmpty { .. } => Self::conflict("TABLE_NOT_EMPTY", e.to_string()),
            e @ (StoreError::NotConnected | StoreError::Connection(_)) => {
                tracing::error!(error = %e, "Span store unavailable");
                Self::service_unavailable("Span store is unavailable")
            }
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::Store(store) => store.into(),
            SyncError::Fetch(fetch @ FetchError::InvalidUrl { .. }) => {
                tracing::error!(error = %fetch, "Tracing backend misconfigured");
                Self::internal("Tracing backend URL is invalid")
            }
            SyncError::Fetch(fetch) if fetch.is_connection() => {
                tracing::error!(error = %fetch, "Tracing backend unreachable");
                Self::service_unavailable("Tracing backend is unreachable")
            }
            SyncError::Fetch(fetch) => {
                tracing::warn!(error = %fetch, "Trace fetch failed");
                Self::bad_gateway("FETCH_FAILED", fetch.to_string())
            }
            SyncError::Flatten(flatten) => {
                tracing::warn!(error = %flatten, "Trace document rejected");
                Self::bad_gateway("INVALID_TRACE_DATA", flatten.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            Self::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, "bad_request", code, message)
            }
            Self::Conflict { code, message } => (StatusCode::CONFLICT, "conflict", code, message),
            Self::BadGateway { code, message } => {
                (StatusCode::BAD_GATEWAY, "bad_gateway", code, message)
            }
            Self::ServiceUnavailable { message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                "SERVICE_UNAVAILABLE".to_string(),
                message,
            ),
            Self::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "INTERNAL".to_string(),
                message,
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": error_type,
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}
