//! Per-invocation request and result types

use crate::models::Credentials;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// One validated sync invocation; immutable for the duration of the sync
#[derive(Debug, Clone)]
pub struct SyncRequest {
    /// Target roster (guild) identifier
    pub guild_id: String,
    pub credentials: Credentials,
    pub request_id: String,
    /// Caller who triggered the sync
    pub initiator_id: String,
    pub created_at: DateTime<Utc>,
    /// Caller-supplied roster size hint
    pub estimated_size: Option<u64>,
    /// Where the background completion message goes, if anywhere
    pub follow_up: Option<FollowUp>,
}

/// Follow-up message target
#[derive(Clone, PartialEq, Eq)]
pub struct FollowUp {
    pub application_id: String,
    pub token: String,
}

impl fmt::Debug for FollowUp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FollowUp")
            .field("application_id", &self.application_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Result of a completed pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub request_id: String,
    pub guild_id: String,
    /// Raw roster entries fetched
    pub fetched: usize,
    /// Entries that survived transformation
    pub eligible: usize,
    /// Identifiers already present in the store
    pub existing: usize,
    /// Rows written by this run
    pub appended: usize,
    pub duration_ms: u64,
}

/// Immediate acknowledgment of a background sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundAck {
    pub request_id: String,
    pub estimated_duration: String,
}
