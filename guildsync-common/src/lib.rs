//! # guildsync Common Library
//!
//! Shared code for the guild member synchronization service:
//! - Common error type
//! - TOML/environment configuration loading
//! - Clock and request-id seams
//! - Caller-facing API response envelope and inbound signature checks

pub mod api;
pub mod config;
pub mod error;
pub mod ids;
pub mod time;

pub use error::{Error, Result};
pub use ids::{IdGenerator, UuidGenerator};
pub use time::{Clock, SystemClock};
