//! Roster → store reconciliation
//!
//! Pure functions, no I/O: [`transform`] turns raw roster entries into
//! canonical rows and [`filter_new`] keeps the rows whose identifier the
//! store does not hold yet.

use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashSet;

use crate::models::{is_valid_snowflake, CanonicalRow, RawMember};

/// Canonical rows for every eligible roster entry
///
/// Dropped: bot accounts, entries without a well-formed identifier, and
/// entries whose user lacks a non-empty account name.
pub fn transform(raw_members: &[RawMember], now: DateTime<Utc>) -> Vec<CanonicalRow> {
    raw_members
        .iter()
        .filter_map(|member| to_row(member, now))
        .collect()
}

fn to_row(member: &RawMember, now: DateTime<Utc>) -> Option<CanonicalRow> {
    if member.is_bot() {
        return None;
    }

    let user = member.user.as_ref()?;
    let external_id = member.external_id().filter(|id| is_valid_snowflake(id))?;
    let account_name = non_blank(user.username.as_deref())?;

    Some(CanonicalRow {
        external_id: external_id.to_string(),
        display_name: resolve_display_name(member, account_name).to_string(),
        account_name: account_name.to_string(),
        join_date: normalize_join_date(member.joined_at.as_deref()),
        is_banned: false,
        is_active: true,
        last_updated: now,
    })
}

/// Nickname, then platform display name, then account name
fn resolve_display_name<'a>(member: &'a RawMember, account_name: &'a str) -> &'a str {
    let global_name = member.user.as_ref().and_then(|u| u.global_name.as_deref());

    non_blank(member.nick.as_deref())
        .or_else(|| non_blank(global_name))
        .unwrap_or(account_name)
}

/// RFC 3339 timestamps are re-rendered in UTC; anything else is kept as-is
fn normalize_join_date(joined_at: Option<&str>) -> String {
    match joined_at {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|ts| {
                ts.with_timezone(&Utc)
                    .to_rfc3339_opts(SecondsFormat::Millis, true)
            })
            .unwrap_or_else(|_| raw.to_string()),
        None => String::new(),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Rows whose external identifier is absent from `existing_ids`, in input order
pub fn filter_new(
    rows: impl IntoIterator<Item = CanonicalRow>,
    existing_ids: &HashSet<String>,
) -> Vec<CanonicalRow> {
    rows.into_iter()
        .filter(|row| !existing_ids.contains(&row.external_id))
        .collect()
}
