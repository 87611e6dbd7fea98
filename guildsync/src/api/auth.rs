//! Inbound signature middleware
//!
//! Applied to the sync routes only. A missing shared secret disables the
//! check entirely.

use axum::{
    body::Body,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use guildsync_common::api::{verify_signature, SignatureError};
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Largest body accepted by the sync routes
const MAX_BODY_BYTES: usize = 1024 * 1024;

pub async fn signature_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(secret) = state.shared_secret.as_deref() else {
        return Ok(next.run(request).await);
    };

    let (parts, body) = request.into_parts();
    let body_bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read body: {}", e)))?;

    let (timestamp, signature) = signature_headers(&parts.headers).map_err(reject)?;
    let now_ms = state.clock.now().timestamp_millis();

    verify_signature(timestamp, &signature, &body_bytes, secret, now_ms).map_err(reject)?;

    let request = Request::from_parts(parts, Body::from(body_bytes));
    Ok(next.run(request).await)
}

fn signature_headers(headers: &HeaderMap) -> Result<(i64, String), SignatureError> {
    let timestamp = headers
        .get(TIMESTAMP_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(SignatureError::MissingHeaders)?;
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(SignatureError::MissingHeaders)?;

    let timestamp = timestamp
        .trim()
        .parse::<i64>()
        .map_err(|_| SignatureError::InvalidTimestamp(format!("not a number: {}", timestamp)))?;

    Ok((timestamp, signature.to_string()))
}

fn reject(error: SignatureError) -> ApiError {
    warn!(error = %error, "Rejected unsigned or mis-signed request");
    ApiError::Unauthorized(error.to_string())
}
