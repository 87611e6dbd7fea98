//! Sync routes
//!
//! - `POST /sync`: synchronous mode, answers once rows are written
//! - `POST /sync/background`: background mode, answers 202 immediately

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use guildsync_common::api::SyncResponse;
use serde_json::json;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::models::SyncCommand;
use crate::notifier::completion_message;
use crate::services::SyncMode;
use crate::AppState;

/// POST /sync
pub async fn sync_now(
    State(state): State<AppState>,
    Json(command): Json<SyncCommand>,
) -> ApiResult<Json<SyncResponse>> {
    let orchestrator = &state.orchestrator;
    let request = orchestrator.prepare(&command, SyncMode::Synchronous)?;
    let request_id = request.request_id.clone();

    let result = orchestrator.execute(&request).await;
    let message = completion_message(&result);
    let outcome = result.map_err(|error| ApiError::Sync {
        error,
        request_id: Some(request_id.clone()),
    })?;

    info!(
        request_id = %request_id,
        new_members = outcome.appended,
        "Synchronous sync answered"
    );

    Ok(Json(
        SyncResponse::ok(message)
            .with_request_id(request_id)
            .with_metadata(json!({
                "newMembers": outcome.appended,
                "fetched": outcome.fetched,
                "eligible": outcome.eligible,
                "existing": outcome.existing,
                "durationMs": outcome.duration_ms,
            })),
    ))
}

/// POST /sync/background
pub async fn sync_background(
    State(state): State<AppState>,
    Json(command): Json<SyncCommand>,
) -> ApiResult<(StatusCode, Json<SyncResponse>)> {
    let ack = state.orchestrator.run_background(&command)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(
            SyncResponse::ok("Sync started; results will follow when it completes")
                .with_request_id(ack.request_id)
                .with_estimated_duration(ack.estimated_duration),
        ),
    ))
}

pub fn sync_routes() -> Router<AppState> {
    Router::new()
        .route("/sync", post(sync_now))
        .route("/sync/background", post(sync_background))
}
