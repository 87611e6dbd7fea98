//! Canned data for the pipeline tests

use guildsync::config::SyncSettings;
use guildsync::models::{Credentials, SyncCommand};
use guildsync_common::config::CredentialsConfig;
use serde_json::{json, Value};

pub const DISCORD_BASE: &str = "https://discord.test/api/v10";
pub const SHEETS_BASE: &str = "https://sheets.test/v4/spreadsheets";
pub const TOKEN_ENDPOINT: &str = "https://oauth2.test/token";
pub const SPREADSHEET_ID: &str = "sheet-123";

pub const ADMIN_ID: &str = "111111111111111111";
pub const ADMIN_CHANNEL: &str = "222222222222222222";
pub const GUILD_ID: &str = "333333333333333333";
pub const CLIENT_EMAIL: &str = "sync@project.iam.example.com";

/// URL fragments routed by [`super::FakeTransport`]
pub const ROSTER_ROUTE: &str = "/guilds/";
pub const TOKEN_ROUTE: &str = "oauth2.test/token";
pub const VALUES_ROUTE: &str = "/values/";
pub const APPEND_ROUTE: &str = ":append";
pub const BATCH_ROUTE: &str = ":batchUpdate";
pub const WEBHOOK_ROUTE: &str = "/webhooks/";

pub fn private_key_pem() -> &'static str {
    include_str!("../fixtures/test_private_key.pem")
}

pub fn public_key_pem() -> &'static str {
    include_str!("../fixtures/test_public_key.pem")
}

pub fn test_credentials() -> Credentials {
    Credentials::new(CLIENT_EMAIL, private_key_pem())
}

/// Settings pointing at the fake hosts, admin checks satisfied by [`sync_command`]
pub fn test_settings() -> SyncSettings {
    SyncSettings {
        discord_api_base: DISCORD_BASE.to_string(),
        bot_token: "bot-token".to_string(),
        admin_user_id: Some(ADMIN_ID.to_string()),
        admin_channel_id: Some(ADMIN_CHANNEL.to_string()),
        sheets_api_base: SHEETS_BASE.to_string(),
        token_endpoint: TOKEN_ENDPOINT.to_string(),
        spreadsheet_id: Some(SPREADSHEET_ID.to_string()),
        credentials: CredentialsConfig {
            client_email: Some(CLIENT_EMAIL.to_string()),
            private_key: Some(private_key_pem().to_string()),
        },
        ..SyncSettings::default()
    }
}

/// 18-digit identifier for roster entry `n`
pub fn snowflake(n: usize) -> String {
    format!("{}", 100_000_000_000_000_000u64 + n as u64)
}

pub fn member_json(n: usize) -> Value {
    json!({
        "user": {
            "id": snowflake(n),
            "username": format!("user{}", n),
            "global_name": null,
        },
        "nick": null,
        "joined_at": "2023-01-15T10:30:00.000000+00:00",
    })
}

/// `count` consecutive entries starting at `start`
pub fn member_page(start: usize, count: usize) -> Value {
    Value::Array((start..start + count).map(member_json).collect())
}

pub fn token_response() -> Value {
    json!({"access_token": "ya29.test-token", "token_type": "Bearer", "expires_in": 3599})
}

/// Column A values as returned by the store: header first
pub fn store_ids(ids: &[&str]) -> Value {
    let mut values = vec![json!(["Discord ID"])];
    values.extend(ids.iter().map(|id| json!([id])));
    json!({"range": "Sheet1!A1:A1000", "majorDimension": "ROWS", "values": values})
}

pub fn append_response(rows: usize) -> Value {
    json!({
        "spreadsheetId": SPREADSHEET_ID,
        "updates": {"updatedRows": rows, "updatedColumns": 7}
    })
}

/// Admin-issued command in the admin channel; extra options appended
pub fn command_json(extra_options: Value) -> Value {
    let options = match extra_options {
        Value::Array(items) => items,
        _ => Vec::new(),
    };

    json!({
        "id": "interaction-1",
        "type": 2,
        "application_id": "app-1",
        "token": "follow-up-token",
        "guild_id": GUILD_ID,
        "channel_id": ADMIN_CHANNEL,
        "member": {"user": {"id": ADMIN_ID}},
        "data": {"name": "sync-members", "options": options},
    })
}

pub fn sync_command(extra_options: Value) -> SyncCommand {
    serde_json::from_value(command_json(extra_options)).unwrap()
}
