//! API error types and JSON error response formatting.
//!
//! `ApiError` maps every `qa_core::QaError` (and request-parsing
//! failures) to the HTTP status / machine-readable code table in §7.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use qa_chat::ChatError;
use qa_core::error::QaError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code, e.g. `"policy_not_initialized"`.
    pub error: String,
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 — malformed request input.
    Validation(String),
    /// 404 — referenced policy id does not exist.
    NotFoundPolicy(i64),
    /// 412 — chat called before init-policy for this session.
    PreconditionPolicyNotInitialized,
    /// 429 — rate limit exceeded.
    TooManyRequests,
    /// 401 — missing/invalid bearer token.
    Unauthorized,
    /// 502 — a required upstream dependency (vector store, metadata
    /// store) failed.
    BadGateway(String),
    /// 500 — anything else (storage, config, lock poisoning).
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg),
            ApiError::NotFoundPolicy(id) => (
                StatusCode::NOT_FOUND,
                "policy_not_found",
                format!("policy {id} not found"),
            ),
            ApiError::PreconditionPolicyNotInitialized => (
                StatusCode::PRECONDITION_FAILED,
                "policy_not_initialized",
                "call /chat/init-policy for this session before /chat".to_string(),
            ),
            ApiError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "too_many_requests",
                "rate limit exceeded".to_string(),
            ),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "missing or invalid bearer token".to_string(),
            ),
            ApiError::BadGateway(msg) => {
                tracing::warn!(error = %msg, "upstream dependency failed");
                (StatusCode::BAD_GATEWAY, "dependency_error", msg)
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "an internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

/// Maps a raised [`QaError`] kind to the recovery/status policy in §7.
/// Transport failures at a *required* dependency (vector store on init,
/// metadata store on search/init) degrade to an explicit 502; everything
/// else that reaches the API boundary unhandled is a 500.
impl From<QaError> for ApiError {
    fn from(err: QaError) -> Self {
        match err {
            QaError::PreconditionPolicyNotInitialized => {
                ApiError::PreconditionPolicyNotInitialized
            }
            QaError::NotFoundPolicy(id) => ApiError::NotFoundPolicy(id),
            QaError::Validation(msg) => ApiError::Validation(msg),
            QaError::TransportVectorStore(msg) => ApiError::BadGateway(msg),
            QaError::TransportMetadataStore(msg) => ApiError::BadGateway(msg),
            QaError::Embedding(msg) => ApiError::BadGateway(msg),
            // Web-search and LLM transport failures are soft-degraded
            // inside the workflows themselves (§4.7/§7) and never reach
            // this boundary as errors; treat them as internal if they do.
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Core(inner) => inner.into(),
            ChatError::EmptyMessage | ChatError::MessageTooLong(_) => {
                ApiError::Validation(err.to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}
