//! HTTP API handlers for guildsync
//!
//! Thin adapters over [`crate::services::SyncOrchestrator`]; the routes
//! deserialize the command, pick the mode and map the result.

pub mod auth;
pub mod health;
pub mod sync;

pub use auth::signature_middleware;
pub use health::health_routes;
pub use sync::sync_routes;
