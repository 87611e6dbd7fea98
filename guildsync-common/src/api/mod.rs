//! API module for shared HTTP API functionality
//!
//! This module contains ONLY pure functions and shared types. The service
//! crate wraps them with framework-specific middleware (Axum).

pub mod auth;
pub mod types;

pub use auth::{calculate_signature, verify_signature, validate_timestamp, SignatureError};
pub use types::SyncResponse;
