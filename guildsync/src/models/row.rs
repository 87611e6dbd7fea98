//! Canonical store rows

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Number of columns in every store row
pub const COLUMN_COUNT: usize = 7;

/// Normalized representation of one roster entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CanonicalRow {
    pub external_id: String,
    pub display_name: String,
    pub account_name: String,
    /// ISO-8601 join timestamp
    pub join_date: String,
    pub is_banned: bool,
    pub is_active: bool,
    pub last_updated: DateTime<Utc>,
}

impl CanonicalRow {
    /// Serialize into the fixed 7-column store order
    ///
    /// Booleans become the literal strings "true"/"false".
    pub fn to_values(&self) -> Vec<String> {
        vec![
            self.external_id.clone(),
            self.display_name.clone(),
            self.account_name.clone(),
            self.join_date.clone(),
            self.is_banned.to_string(),
            self.is_active.to_string(),
            self.last_updated.to_rfc3339_opts(SecondsFormat::Millis, true),
        ]
    }
}
