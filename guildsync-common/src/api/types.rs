//! Caller-facing response envelope
//!
//! Every sync route answers with the same JSON shape:
//!
//! ```json
//! {"success": true, "message": "...", "requestId": "...", "estimatedDuration": "...", "metadata": {...}}
//! {"success": false, "error": "...", "requestId": "..."}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response body for sync routes
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl SyncResponse {
    /// Successful response carrying a human-readable message
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            request_id: None,
            estimated_duration: None,
            metadata: None,
        }
    }

    /// Failed response carrying the originating error message
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            request_id: None,
            estimated_duration: None,
            metadata: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_estimated_duration(mut self, estimate: impl Into<String>) -> Self {
        self.estimated_duration = Some(estimate.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}
