//! Error types for guildsync
//!
//! Component errors (`RosterError`, `TokenError`, `StoreError`,
//! `ValidationError`) are folded into [`SyncError`], the pipeline taxonomy.
//! [`ApiError`] turns them into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use guildsync_common::api::SyncResponse;
use thiserror::Error;

use crate::services::record_store::StoreError;
use crate::services::roster_client::RosterError;
use crate::services::token_issuer::TokenError;
use crate::services::validation::{ValidationError, ValidationStage};

/// Pipeline failure taxonomy
///
/// `Display` preserves the originating message verbatim.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Malformed input or failed permission/format checks
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Token issuance or credential-format failure
    #[error(transparent)]
    Auth(#[from] TokenError),

    /// Roster API failure
    #[error(transparent)]
    Upstream(#[from] RosterError),

    /// Store read/append/delete failure
    #[error(transparent)]
    Storage(#[from] StoreError),

    /// Estimated roster size exceeds the hard cap
    #[error("{0}")]
    SafetyLimit(String),

    /// The pipeline panicked; converted so nothing crosses the boundary unhandled
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Short machine-readable category
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Validation(_) => "validation",
            SyncError::Auth(_) => "auth",
            SyncError::Upstream(_) => "upstream",
            SyncError::Storage(_) => "storage",
            SyncError::SafetyLimit(_) => "safety_limit",
            SyncError::Internal(_) => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            SyncError::Validation(e) if e.stage == ValidationStage::Permission => {
                StatusCode::FORBIDDEN
            }
            SyncError::Validation(e) if e.stage == ValidationStage::ExecutionContext => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            SyncError::Validation(_) => StatusCode::BAD_REQUEST,
            SyncError::Auth(_) => StatusCode::UNAUTHORIZED,
            SyncError::Upstream(_) | SyncError::Storage(_) => StatusCode::BAD_GATEWAY,
            SyncError::SafetyLimit(_) => StatusCode::PAYLOAD_TOO_LARGE,
            SyncError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// HTTP-surface error
#[derive(Debug, Error)]
pub enum ApiError {
    /// Pipeline or validation failure for a given request
    #[error("{error}")]
    Sync {
        error: SyncError,
        request_id: Option<String>,
    },

    /// Inbound signature check failed (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request body could not be read (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl From<SyncError> for ApiError {
    fn from(error: SyncError) -> Self {
        ApiError::Sync {
            error,
            request_id: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Sync { error, request_id } => {
                let mut body = SyncResponse::failure(error.to_string());
                if let Some(id) = request_id {
                    body = body.with_request_id(id);
                }
                (error.status_code(), body)
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, SyncResponse::failure(msg)),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, SyncResponse::failure(msg)),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
