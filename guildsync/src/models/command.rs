//! Inbound sync command (interaction-shaped JSON)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Option names recognised on the sync command
pub const OPTION_GUILD_ID: &str = "guild_id";
pub const OPTION_ESTIMATED_MEMBERS: &str = "estimated_members";
pub const OPTION_CLIENT_EMAIL: &str = "client_email";
pub const OPTION_PRIVATE_KEY: &str = "private_key";
pub const OPTION_REQUEST_ID: &str = "request_id";

/// Sync command as delivered by the command surface
///
/// All fields are optional; the validation chain decides what is required.
#[derive(Clone, Default, Deserialize, Serialize)]
pub struct SyncCommand {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<u8>,
    #[serde(default)]
    pub application_id: Option<String>,
    /// Follow-up token used to post the background completion message
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub member: Option<InteractionMember>,
    #[serde(default)]
    pub user: Option<CommandUser>,
    #[serde(default)]
    pub data: Option<CommandData>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InteractionMember {
    #[serde(default)]
    pub user: Option<CommandUser>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CommandUser {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CommandData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub options: Vec<CommandOption>,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct CommandOption {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

impl SyncCommand {
    /// Explicit user id, falling back to the embedded member's user id
    pub fn caller_id(&self) -> Option<&str> {
        let explicit = self.user.as_ref().and_then(|u| non_empty(u.id.as_deref()));
        explicit.or_else(|| {
            self.member
                .as_ref()
                .and_then(|m| m.user.as_ref())
                .and_then(|u| non_empty(u.id.as_deref()))
        })
    }

    pub fn command_name(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| non_empty(d.name.as_deref()))
    }

    /// Raw option value, if the option was supplied
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.data
            .as_ref()?
            .options
            .iter()
            .find(|o| o.name == name)
            .map(|o| &o.value)
    }

    /// String option value; blank strings count as absent
    pub fn option_str(&self, name: &str) -> Option<&str> {
        non_empty(self.option(name)?.as_str())
    }

    /// Numeric option value, accepting numbers or numeric strings
    ///
    /// `None` when the option is absent, null or blank. `Some(None)` when it
    /// is present but not a finite number.
    pub fn option_number(&self, name: &str) -> Option<Option<f64>> {
        match self.option(name)? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(s.trim().parse::<f64>().ok().filter(|n| n.is_finite())),
            Value::Number(n) => Some(n.as_f64().filter(|n| n.is_finite())),
            _ => Some(None),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl fmt::Debug for SyncCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncCommand")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("guild_id", &self.guild_id)
            .field("channel_id", &self.channel_id)
            .field("caller_id", &self.caller_id())
            .field("command_name", &self.command_name())
            .finish_non_exhaustive()
    }
}

impl fmt::Debug for CommandOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value: &dyn fmt::Debug = if self.name == OPTION_PRIVATE_KEY {
            &"<redacted>"
        } else {
            &self.value
        };
        f.debug_struct("CommandOption")
            .field("name", &self.name)
            .field("value", value)
            .finish()
    }
}
