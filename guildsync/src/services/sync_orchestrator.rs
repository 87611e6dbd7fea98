//! Sync orchestration
//!
//! Two entry points share one validation chain and one pipeline:
//!
//! - [`SyncOrchestrator::run_sync`] runs the pipeline to completion and
//!   returns the number of rows written.
//! - [`SyncOrchestrator::run_background`] registers the pipeline with the
//!   host's [`KeepAlive`] and returns an acknowledgment immediately. The
//!   outcome only reaches the caller through the [`SyncNotifier`].
//!
//! Pipeline: token → existing ids → roster fetch → transform → filter → append.
//! Steps are strictly sequential; each request builds its own token, id set
//! and roster snapshot.

use futures::FutureExt;
use guildsync_common::{Clock, IdGenerator};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::SyncSettings;
use crate::error::SyncError;
use crate::http::HttpTransport;
use crate::keep_alive::KeepAlive;
use crate::models::{BackgroundAck, SyncCommand, SyncOutcome, SyncRequest};
use crate::notifier::{LogNotifier, SyncNotifier};
use crate::services::reconciler;
use crate::services::record_store::RecordStore;
use crate::services::roster_client::RosterClient;
use crate::services::token_issuer::TokenIssuer;
use crate::services::validation::{self, SyncMode, ValidationError, ValidationStage};

/// Coarse duration estimate from an optional roster size hint
pub fn estimated_duration(size_hint: Option<u64>) -> &'static str {
    match size_hint {
        None => "1-2 minutes",
        Some(n) if n < 1_000 => "under 30 seconds",
        Some(n) if n < 10_000 => "1-2 minutes",
        Some(n) if n < 50_000 => "2-5 minutes",
        Some(_) => "5-10 minutes",
    }
}

/// Wires token issuance, store access, roster fetch and reconciliation
#[derive(Clone)]
pub struct SyncOrchestrator {
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    keep_alive: Option<Arc<dyn KeepAlive>>,
    notifier: Arc<dyn SyncNotifier>,
    settings: Arc<SyncSettings>,
}

impl SyncOrchestrator {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            transport,
            clock,
            ids,
            keep_alive: None,
            notifier: Arc::new(LogNotifier),
            settings: Arc::new(settings),
        }
    }

    /// Enable background mode
    pub fn with_keep_alive(mut self, keep_alive: Arc<dyn KeepAlive>) -> Self {
        self.keep_alive = Some(keep_alive);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn SyncNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn background_enabled(&self) -> bool {
        self.keep_alive.is_some()
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Run the validation chain and build the per-invocation request
    ///
    /// No network call happens here.
    pub fn prepare(&self, command: &SyncCommand, mode: SyncMode) -> Result<SyncRequest, SyncError> {
        let validated =
            validation::validate(command, mode, self.keep_alive.is_some(), &self.settings)?;

        let request_id = validated
            .request_id
            .unwrap_or_else(|| self.ids.next_id());

        Ok(SyncRequest {
            guild_id: validated.guild_id,
            credentials: validated.credentials,
            request_id,
            initiator_id: validated.initiator_id,
            created_at: self.clock.now(),
            estimated_size: validated.estimated_size,
            follow_up: validated.follow_up,
        })
    }

    /// Synchronous mode: validate, run the pipeline, return the outcome
    pub async fn run_sync(&self, command: &SyncCommand) -> Result<SyncOutcome, SyncError> {
        let request = self.prepare(command, SyncMode::Synchronous)?;
        self.execute(&request).await
    }

    /// Background mode: validate, hand the pipeline to the keep-alive, acknowledge
    ///
    /// The acknowledgment means "in progress", never "succeeded".
    pub fn run_background(&self, command: &SyncCommand) -> Result<BackgroundAck, SyncError> {
        let request = self.prepare(command, SyncMode::Background)?;

        let keep_alive = self.keep_alive.clone().ok_or_else(|| {
            ValidationError::new(
                ValidationStage::ExecutionContext,
                "Background execution is not available",
            )
        })?;

        let ack = BackgroundAck {
            request_id: request.request_id.clone(),
            estimated_duration: estimated_duration(request.estimated_size).to_string(),
        };

        info!(
            request_id = %request.request_id,
            guild_id = %request.guild_id,
            initiator = %request.initiator_id,
            estimated_duration = %ack.estimated_duration,
            "Background sync scheduled"
        );

        let orchestrator = self.clone();
        keep_alive.register(
            async move {
                let result = orchestrator.execute(&request).await;
                orchestrator.notifier.notify(&request, &result).await;
            }
            .boxed(),
        );

        Ok(ack)
    }

    /// Run the pipeline for a prepared request
    ///
    /// A panic inside the pipeline becomes [`SyncError::Internal`].
    pub async fn execute(&self, request: &SyncRequest) -> Result<SyncOutcome, SyncError> {
        match AssertUnwindSafe(self.pipeline(request)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(request_id = %request.request_id, error = %message, "Sync pipeline panicked");
                Err(SyncError::Internal(message))
            }
        }
    }

    async fn pipeline(&self, request: &SyncRequest) -> Result<SyncOutcome, SyncError> {
        let started = self.clock.now();

        info!(
            request_id = %request.request_id,
            guild_id = %request.guild_id,
            "Sync started"
        );

        let token = TokenIssuer::new(self.transport.clone(), self.clock.clone())
            .with_endpoint(&self.settings.token_endpoint)
            .issue_token(&request.credentials)
            .await?;

        let store = RecordStore::new(
            self.transport.clone(),
            self.settings.store_config(),
            Some(token),
        );
        let existing = store.read_existing_ids().await?;

        let roster = RosterClient::new(
            self.transport.clone(),
            self.clock.clone(),
            self.settings.roster_client_config(),
        );
        let raw_members = roster.fetch_all(&request.guild_id).await?;

        let rows = reconciler::transform(&raw_members, self.clock.now());
        let eligible = rows.len();
        let new_rows = reconciler::filter_new(rows, &existing);

        let appended = store.append(&new_rows).await?;

        let duration_ms = (self.clock.now() - started).num_milliseconds().max(0) as u64;

        info!(
            request_id = %request.request_id,
            guild_id = %request.guild_id,
            fetched = raw_members.len(),
            eligible,
            existing = existing.len(),
            appended,
            roster_requests = roster.requests_issued(),
            duration_ms,
            "Sync finished"
        );

        Ok(SyncOutcome {
            request_id: request.request_id.clone(),
            guild_id: request.guild_id.clone(),
            fetched: raw_members.len(),
            eligible,
            existing: existing.len(),
            appended,
            duration_ms,
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "sync pipeline panicked".to_string()
    }
}
