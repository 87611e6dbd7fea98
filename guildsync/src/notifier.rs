//! Background completion notifier
//!
//! Background mode cannot report completion through its response, so the
//! settled result is handed to a [`SyncNotifier`]. Notifier failures are
//! logged and never propagate.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::SyncError;
use crate::http::{HttpRequest, HttpTransport};
use crate::models::{FollowUp, SyncOutcome, SyncRequest};
use reqwest::Url;

#[async_trait]
pub trait SyncNotifier: Send + Sync {
    async fn notify(&self, request: &SyncRequest, result: &Result<SyncOutcome, SyncError>);
}

/// Human-readable completion message
pub fn completion_message(result: &Result<SyncOutcome, SyncError>) -> String {
    match result {
        Ok(outcome) if outcome.appended == 0 => format!(
            "Sync complete: no new members ({} fetched, {} already present)",
            outcome.fetched, outcome.existing
        ),
        Ok(outcome) => format!(
            "Sync complete: {} new members added ({} fetched, {} already present)",
            outcome.appended, outcome.fetched, outcome.existing
        ),
        Err(e) => format!("Sync failed: {}", e),
    }
}

/// Records completion in the server log only
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl SyncNotifier for LogNotifier {
    async fn notify(&self, request: &SyncRequest, result: &Result<SyncOutcome, SyncError>) {
        match result {
            Ok(outcome) => info!(
                request_id = %request.request_id,
                guild_id = %request.guild_id,
                appended = outcome.appended,
                duration_ms = outcome.duration_ms,
                "Background sync completed"
            ),
            Err(e) => error!(
                request_id = %request.request_id,
                guild_id = %request.guild_id,
                kind = e.kind(),
                error = %e,
                "Background sync failed"
            ),
        }
    }
}

/// Posts a follow-up message to the originating conversation
///
/// Requests without a follow-up target only get the log entry.
pub struct FollowUpNotifier {
    transport: Arc<dyn HttpTransport>,
    api_base: String,
}

impl FollowUpNotifier {
    pub fn new(transport: Arc<dyn HttpTransport>, api_base: impl Into<String>) -> Self {
        Self {
            transport,
            api_base: api_base.into(),
        }
    }
}

impl FollowUpNotifier {
    /// `{api_base}/webhooks/{application_id}/{token}`, each part one segment
    fn webhook_url(&self, target: &FollowUp) -> Option<Url> {
        let mut url = Url::parse(&self.api_base).ok()?;
        url.path_segments_mut()
            .ok()?
            .pop_if_empty()
            .push("webhooks")
            .push(&target.application_id)
            .push(&target.token);
        Some(url)
    }
}

#[async_trait]
impl SyncNotifier for FollowUpNotifier {
    async fn notify(&self, request: &SyncRequest, result: &Result<SyncOutcome, SyncError>) {
        LogNotifier.notify(request, result).await;

        let Some(target) = &request.follow_up else {
            return;
        };

        let Some(url) = self.webhook_url(target) else {
            warn!(
                request_id = %request.request_id,
                api_base = %self.api_base,
                "Follow-up skipped: invalid API base"
            );
            return;
        };
        let message = HttpRequest::post(url.as_str()).json(json!({ "content": completion_message(result) }));

        match self.transport.send(message).await {
            Ok(response) if response.is_success() => {}
            Ok(response) => warn!(
                request_id = %request.request_id,
                status = response.status,
                "Follow-up message rejected"
            ),
            Err(e) => warn!(
                request_id = %request.request_id,
                error = %e,
                "Follow-up message failed"
            ),
        }
    }
}
