//! Roster (guild membership) API client
//!
//! Cursor pagination over `GET /guilds/{id}/members?limit=1000[&after={lastId}]`:
//! the first request carries no cursor, each following request uses the
//! identifier of the last entry of the previous page, and pagination stops at
//! the first page holding fewer than [`PAGE_SIZE`] entries (an empty page
//! included).
//!
//! HTTP 429 handling: a global limit fails immediately; a local limit sleeps
//! for `retry_after` seconds and re-issues the same page request once.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use guildsync_common::Clock;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::http::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use crate::models::RawMember;

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Entries requested per page
pub const PAGE_SIZE: usize = 1000;

/// Upper bound on a server-provided `retry_after`
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Roster client errors
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success status other than a handled 429 (403, 404, 400, ...)
    #[error("Discord API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Global rate limit exceeded (retry after {retry_after:.1}s)")]
    GlobalRateLimit { retry_after: f64 },

    #[error("Rate limit exceeded after retry")]
    RateLimited,

    #[error("Invalid response format")]
    InvalidResponse,

    #[error("Invalid roster URL: {0}")]
    InvalidUrl(String),
}

impl RosterError {
    /// Upstream HTTP status, when one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            RosterError::Api { status, .. } => Some(*status),
            RosterError::GlobalRateLimit { .. } | RosterError::RateLimited => Some(429),
            _ => None,
        }
    }
}

impl From<TransportError> for RosterError {
    fn from(e: TransportError) -> Self {
        RosterError::Network(e.to_string())
    }
}

/// Error body `{message, code}`; 429 bodies add `retry_after` and `global`
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    retry_after: Option<f64>,
    #[serde(default)]
    global: Option<bool>,
}

/// Roster client settings
#[derive(Clone)]
pub struct RosterClientConfig {
    pub api_base: String,
    pub bot_token: String,
    /// Delay before the single retry when a 429 carries no `retry_after`
    pub default_retry_after: Duration,
    /// Client-side pacing of page requests
    pub requests_per_second: u32,
}

impl RosterClientConfig {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            bot_token: bot_token.into(),
            default_retry_after: Duration::from_millis(1000),
            requests_per_second: 50,
        }
    }
}

/// Paginated, rate-limit-aware roster client
///
/// Counters live on the instance, so concurrent syncs using separate clients
/// never share pagination state.
pub struct RosterClient {
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    config: RosterClientConfig,
    rate_limiter: DefaultDirectRateLimiter,
    requests_issued: AtomicU64,
    rate_limit_retries: AtomicU64,
}

impl RosterClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
        config: RosterClientConfig,
    ) -> Self {
        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_second));

        Self {
            transport,
            clock,
            config,
            rate_limiter,
            requests_issued: AtomicU64::new(0),
            rate_limit_retries: AtomicU64::new(0),
        }
    }

    /// Requests sent by this client so far (retries included)
    pub fn requests_issued(&self) -> u64 {
        self.requests_issued.load(Ordering::Relaxed)
    }

    /// 429 retries performed by this client so far
    pub fn rate_limit_retries(&self) -> u64 {
        self.rate_limit_retries.load(Ordering::Relaxed)
    }

    /// Fetch every roster entry of `guild_id`
    pub async fn fetch_all(&self, guild_id: &str) -> Result<Vec<RawMember>, RosterError> {
        let mut members = Vec::new();
        let mut after: Option<String> = None;
        let mut page_number = 0u32;

        loop {
            page_number += 1;
            let page = self.fetch_page(guild_id, after.as_deref()).await?;
            let page_len = page.len();

            debug!(
                guild_id = %guild_id,
                page = page_number,
                entries = page_len,
                "Fetched roster page"
            );

            if page_len == 0 {
                break;
            }

            after = Some(page_cursor(&page)?.to_string());
            members.extend(page);

            if page_len < PAGE_SIZE {
                break;
            }
        }

        info!(
            guild_id = %guild_id,
            members = members.len(),
            pages = page_number,
            "Fetched roster"
        );

        Ok(members)
    }

    /// Fetch one page, retrying once on a local rate limit
    async fn fetch_page(
        &self,
        guild_id: &str,
        after: Option<&str>,
    ) -> Result<Vec<RawMember>, RosterError> {
        let response = self.send_page_request(guild_id, after).await?;

        let response = if response.status == 429 {
            let delay = self.retry_delay(&response)?;
            warn!(
                guild_id = %guild_id,
                after = after.unwrap_or("-"),
                delay_ms = delay.as_millis() as u64,
                "Roster request rate limited, retrying once"
            );
            self.clock.sleep(delay).await;
            self.rate_limit_retries.fetch_add(1, Ordering::Relaxed);

            let retry = self.send_page_request(guild_id, after).await?;
            if retry.status == 429 {
                return Err(RosterError::RateLimited);
            }
            retry
        } else {
            response
        };

        parse_page(&response)
    }

    async fn send_page_request(
        &self,
        guild_id: &str,
        after: Option<&str>,
    ) -> Result<HttpResponse, RosterError> {
        self.rate_limiter.until_ready().await;

        let url = self.members_url(guild_id, after)?;

        let request = HttpRequest::get(url.as_str())
            .header("Authorization", format!("Bot {}", self.config.bot_token));

        self.requests_issued.fetch_add(1, Ordering::Relaxed);
        Ok(self.transport.send(request).await?)
    }

    /// `{api_base}/guilds/{guild_id}/members?limit=1000[&after={cursor}]`
    ///
    /// The id and cursor are pushed as single encoded segments/pairs so they
    /// cannot change the request path.
    fn members_url(&self, guild_id: &str, after: Option<&str>) -> Result<Url, RosterError> {
        let mut url = Url::parse(&self.config.api_base)
            .map_err(|e| RosterError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| RosterError::InvalidUrl(self.config.api_base.clone()))?
            .pop_if_empty()
            .push("guilds")
            .push(guild_id)
            .push("members");
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &PAGE_SIZE.to_string());
            if let Some(cursor) = after {
                query.append_pair("after", cursor);
            }
        }
        Ok(url)
    }

    /// Delay for a 429 response; global limits are not retried
    fn retry_delay(&self, response: &HttpResponse) -> Result<Duration, RosterError> {
        let body: ApiErrorBody = response.parse().unwrap_or_default();

        if body.global.unwrap_or(false) {
            return Err(RosterError::GlobalRateLimit {
                retry_after: body.retry_after.unwrap_or(0.0),
            });
        }

        let delay = body
            .retry_after
            .filter(|secs| secs.is_finite() && *secs >= 0.0)
            .map(|secs| Duration::from_secs_f64(secs).min(MAX_RETRY_AFTER))
            .unwrap_or(self.config.default_retry_after);

        Ok(delay)
    }
}

/// Decode a page response
///
/// Entries that are not member objects become empty members so the page
/// length (which drives pagination) is preserved; the reconciler drops them.
fn parse_page(response: &HttpResponse) -> Result<Vec<RawMember>, RosterError> {
    if !response.is_success() {
        let body: ApiErrorBody = response.parse().unwrap_or_default();
        let message = body
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| response.reason().to_string());
        return Err(RosterError::Api {
            status: response.status,
            message,
        });
    }

    let value: Value = response.parse().map_err(|_| RosterError::InvalidResponse)?;
    let Value::Array(entries) = value else {
        return Err(RosterError::InvalidResponse);
    };

    Ok(entries
        .into_iter()
        .map(|entry| serde_json::from_value(entry).unwrap_or_default())
        .collect())
}

/// Cursor for the next page: identifier of the last entry that has one
fn page_cursor(page: &[RawMember]) -> Result<&str, RosterError> {
    page.iter()
        .rev()
        .find_map(RawMember::external_id)
        .ok_or(RosterError::InvalidResponse)
}
