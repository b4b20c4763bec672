//! API error types.
//!
//! Messages are deliberately coarse: every challenge failure reads the
//! same, and every code failure reads the same.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dailyread_accounts::AccountError;
use dailyread_sources::SourceError;
use dailyread_store::StoreError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error("verification failed")]
    VerificationFailed,

    #[error("invalid or expired code")]
    CodeInvalid,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("login required")]
    Unauthorized,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("could not send email")]
    DeliveryFailed,

    #[error("daily content is unavailable")]
    Unavailable,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("server error: {0}")]
    Server(String),
}

/// Error response body.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            RpcError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            RpcError::VerificationFailed => (StatusCode::BAD_REQUEST, "VERIFICATION_FAILED"),
            RpcError::CodeInvalid => (StatusCode::BAD_REQUEST, "CODE_INVALID"),
            RpcError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            RpcError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            RpcError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            RpcError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            RpcError::DeliveryFailed => (StatusCode::BAD_GATEWAY, "DELIVERY_FAILED"),
            RpcError::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
            RpcError::Internal(_) | RpcError::Server(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        let error = match &self {
            RpcError::Internal(detail) | RpcError::Server(detail) => {
                tracing::error!(%detail, "request failed");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error, code })).into_response()
    }
}

impl From<AccountError> for RpcError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::Challenge(_) => RpcError::VerificationFailed,
            AccountError::CodeInvalid => RpcError::CodeInvalid,
            AccountError::InvalidCredentials => RpcError::InvalidCredentials,
            AccountError::EmailTaken | AccountError::UsernameTaken => RpcError::Conflict(e.to_string()),
            AccountError::NotFound => RpcError::NotFound(e.to_string()),
            AccountError::InvalidInput(msg) => RpcError::BadRequest(msg),
            AccountError::DeliveryFailed(_) => RpcError::DeliveryFailed,
            AccountError::Hashing(msg) => RpcError::Internal(msg),
            AccountError::Store(inner) => RpcError::from(inner),
        }
    }
}

impl From<SourceError> for RpcError {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::NoEnabledSources | SourceError::AllSourcesExhausted { .. } => RpcError::Unavailable,
            other => RpcError::Internal(other.to_string()),
        }
    }
}

impl From<StoreError> for RpcError {
    fn from(e: StoreError) -> Self {
        RpcError::Internal(e.to_string())
    }
}
