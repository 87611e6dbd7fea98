//! Inbound request signature checks
//!
//! Requests to the sync routes may be signed with a shared secret:
//! - `X-Signature-Timestamp`: Unix epoch milliseconds
//! - `X-Signature`: hex SHA-256 of `timestamp + body + secret`
//!
//! Pure functions only; the service crate wraps them in Axum middleware.

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Maximum accepted age (or future skew) of a signed request
pub const MAX_TIMESTAMP_SKEW_MS: i64 = 5 * 60 * 1000;

/// Signature validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("Missing signature headers")]
    MissingHeaders,

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid signature")]
    InvalidSignature,
}

/// Check that `timestamp` lies within the accepted window around `now_ms`
pub fn validate_timestamp(timestamp: i64, now_ms: i64) -> Result<(), SignatureError> {
    let diff = now_ms - timestamp;

    if diff > MAX_TIMESTAMP_SKEW_MS {
        return Err(SignatureError::InvalidTimestamp(format!(
            "Timestamp {}ms too old (max {}ms past)",
            diff, MAX_TIMESTAMP_SKEW_MS
        )));
    }

    if diff < -MAX_TIMESTAMP_SKEW_MS {
        return Err(SignatureError::InvalidTimestamp(format!(
            "Timestamp {}ms in future (max {}ms future)",
            diff.abs(),
            MAX_TIMESTAMP_SKEW_MS
        )));
    }

    Ok(())
}

/// Calculate the signature for a request body
pub fn calculate_signature(timestamp: i64, body: &[u8], secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(body);
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Validate timestamp freshness and signature
pub fn verify_signature(
    timestamp: i64,
    signature: &str,
    body: &[u8],
    secret: &str,
    now_ms: i64,
) -> Result<(), SignatureError> {
    validate_timestamp(timestamp, now_ms)?;

    let expected = calculate_signature(timestamp, body, secret);
    if expected.eq_ignore_ascii_case(signature.trim()) {
        Ok(())
    } else {
        Err(SignatureError::InvalidSignature)
    }
}
