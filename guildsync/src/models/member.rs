//! Roster entries as returned by the membership API

use serde::{Deserialize, Serialize};

/// One entry of a roster page
///
/// Every field is optional so a single malformed entry never fails the whole
/// page; the reconciler drops entries that lack what it needs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawMember {
    #[serde(default)]
    pub user: Option<RawUser>,
    /// Guild-specific nickname
    #[serde(default)]
    pub nick: Option<String>,
    /// ISO-8601 join timestamp
    #[serde(default)]
    pub joined_at: Option<String>,
}

/// User sub-object of a roster entry
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawUser {
    #[serde(default)]
    pub id: Option<String>,
    /// Account name
    #[serde(default)]
    pub username: Option<String>,
    /// Platform-wide display name
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub bot: Option<bool>,
}

impl RawMember {
    /// External identifier, if present and non-empty
    pub fn external_id(&self) -> Option<&str> {
        self.user
            .as_ref()
            .and_then(|u| u.id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn is_bot(&self) -> bool {
        self.user
            .as_ref()
            .and_then(|u| u.bot)
            .unwrap_or(false)
    }
}

/// External identifiers are snowflakes: 17 to 20 ASCII digits
pub fn is_valid_snowflake(value: &str) -> bool {
    (17..=20).contains(&value.len()) && value.bytes().all(|b| b.is_ascii_digit())
}
