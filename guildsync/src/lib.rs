//! guildsync library interface
//!
//! One-way synchronization of a guild roster into a spreadsheet record
//! store. Exposes the pipeline and the HTTP router for integration testing.

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod keep_alive;
pub mod models;
pub mod notifier;
pub mod services;

pub use crate::error::{ApiError, ApiResult, SyncError};

use axum::Router;
use chrono::{DateTime, Utc};
use guildsync_common::Clock;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::services::SyncOrchestrator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: SyncOrchestrator,
    /// Enables the inbound signature check when set
    pub shared_secret: Option<String>,
    pub clock: Arc<dyn Clock>,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        orchestrator: SyncOrchestrator,
        shared_secret: Option<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let startup_time = clock.now();
        Self {
            orchestrator,
            shared_secret,
            clock,
            startup_time,
        }
    }
}

/// Build application router
///
/// Sync routes sit behind the signature middleware; `/health` does not.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    let protected = api::sync_routes().layer(middleware::from_fn_with_state(
        state.clone(),
        api::signature_middleware,
    ));

    Router::new()
        .merge(protected)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
