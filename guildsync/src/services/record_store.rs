//! Spreadsheet-backed record store
//!
//! Rows are keyed by the external identifier in column A; row 1 holds the
//! header. Four operations: read existing ids, batched append, find rows by
//! column value, delete rows.

use reqwest::Url;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::http::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use crate::models::{is_valid_snowflake, CanonicalRow};
use crate::services::token_issuer::BearerToken;

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// First data row (row 1 is the header)
pub const FIRST_DATA_ROW: usize = 2;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing required fields")]
    MissingFields,

    /// Upstream error message, verbatim
    #[error("{0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid row index {0}: data rows start at 2")]
    InvalidRowIndex(usize),
}

impl From<TransportError> for StoreError {
    fn from(e: TransportError) -> Self {
        StoreError::Network(e.to_string())
    }
}

/// Store location
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub api_base: String,
    pub spreadsheet_id: String,
    /// Range holding the external identifiers, e.g. `Sheet1!A:A`
    pub range: String,
    /// Numeric sheet id targeted by row deletion
    pub sheet_id: i64,
}

impl StoreConfig {
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            range: "Sheet1!A:A".to_string(),
            sheet_id: 0,
        }
    }

    /// Full-width range (`A:G`) on the sheet named by `range`
    pub fn data_range(&self) -> String {
        match self.range.split_once('!') {
            Some((sheet, _)) => format!("{}!A:G", sheet),
            None => "A:G".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
struct AppendResponse {
    #[serde(default)]
    updates: Option<AppendUpdates>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    #[serde(default)]
    updated_rows: Option<usize>,
}

/// Spreadsheet store client bound to one access token
pub struct RecordStore {
    transport: Arc<dyn HttpTransport>,
    config: StoreConfig,
    access_token: Option<BearerToken>,
}

impl RecordStore {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        config: StoreConfig,
        access_token: Option<BearerToken>,
    ) -> Self {
        Self {
            transport,
            config,
            access_token,
        }
    }

    /// External identifiers present in column A
    ///
    /// The header row, blanks and malformed values are skipped silently.
    pub async fn read_existing_ids(&self) -> Result<HashSet<String>, StoreError> {
        let token = self.ensure_configured()?;
        let url = self.values_url(&self.config.range, "")?;

        let response = self.send(HttpRequest::get(url), token).await?;
        let range: ValueRange = parse_success(&response)?;

        let ids: HashSet<String> = range
            .values
            .iter()
            .skip(1)
            .filter_map(|row| row.first().and_then(cell_text))
            .filter(|id| is_valid_snowflake(id))
            .collect();

        debug!(
            rows = range.values.len().saturating_sub(1),
            ids = ids.len(),
            "Read existing ids"
        );

        Ok(ids)
    }

    /// Append rows in a single batched write
    pub async fn append(&self, rows: &[CanonicalRow]) -> Result<usize, StoreError> {
        let token = self.ensure_configured()?;
        if rows.is_empty() {
            return Ok(0);
        }

        let mut url = self.values_url(&self.config.data_range(), ":append")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");

        let values: Vec<Vec<String>> = rows.iter().map(CanonicalRow::to_values).collect();
        let request = HttpRequest::post(url).json(json!({ "values": values }));

        let response = self.send(request, token).await?;
        let body: AppendResponse = parse_success(&response)?;

        let appended = body
            .updates
            .and_then(|u| u.updated_rows)
            .unwrap_or(rows.len());

        info!(rows = appended, "Appended rows to store");
        Ok(appended)
    }

    /// 1-indexed rows whose `column_index` (0 = column A) equals `value`
    pub async fn find_rows(&self, column_index: usize, value: &str) -> Result<Vec<usize>, StoreError> {
        let token = self.ensure_configured()?;
        let url = self.values_url(&self.config.data_range(), "")?;

        let response = self.send(HttpRequest::get(url), token).await?;
        let range: ValueRange = parse_success(&response)?;

        Ok(range
            .values
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, row)| {
                row.get(column_index)
                    .and_then(cell_text)
                    .is_some_and(|cell| cell == value)
            })
            .map(|(i, _)| i + 1)
            .collect())
    }

    /// Delete rows by 1-indexed row number
    ///
    /// Requests are issued in descending order so earlier deletions never
    /// shift the rows still to be deleted.
    pub async fn delete_rows(&self, row_indexes: &[usize]) -> Result<usize, StoreError> {
        let token = self.ensure_configured()?;
        if row_indexes.is_empty() {
            return Ok(0);
        }

        if let Some(&bad) = row_indexes.iter().find(|&&r| r < FIRST_DATA_ROW) {
            return Err(StoreError::InvalidRowIndex(bad));
        }

        let mut rows = row_indexes.to_vec();
        rows.sort_unstable_by(|a, b| b.cmp(a));
        rows.dedup();

        let requests: Vec<Value> = rows
            .iter()
            .map(|&row| {
                json!({
                    "deleteDimension": {
                        "range": {
                            "sheetId": self.config.sheet_id,
                            "dimension": "ROWS",
                            "startIndex": row - 1,
                            "endIndex": row,
                        }
                    }
                })
            })
            .collect();

        let url = self.spreadsheet_url(":batchUpdate")?;
        let request = HttpRequest::post(url).json(json!({ "requests": requests }));

        let response = self.send(request, token).await?;
        if !response.is_success() {
            return Err(upstream_error(&response));
        }

        info!(rows = rows.len(), "Deleted rows from store");
        Ok(rows.len())
    }

    fn ensure_configured(&self) -> Result<&BearerToken, StoreError> {
        let token = self
            .access_token
            .as_ref()
            .filter(|t| !t.as_str().is_empty());

        match token {
            Some(token)
                if !self.config.spreadsheet_id.trim().is_empty()
                    && !self.config.range.trim().is_empty() =>
            {
                Ok(token)
            }
            _ => Err(StoreError::MissingFields),
        }
    }

    async fn send(&self, request: HttpRequest, token: &BearerToken) -> Result<HttpResponse, StoreError> {
        let request = request.header("Authorization", format!("Bearer {}", token.as_str()));
        Ok(self.transport.send(request).await?)
    }

    /// `{api_base}/{spreadsheet_id}{suffix}`
    fn spreadsheet_url(&self, suffix: &str) -> Result<Url, StoreError> {
        let mut url = self.base_url()?;
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(self.config.api_base.clone()))?
            .pop_if_empty()
            .push(&format!("{}{}", self.config.spreadsheet_id, suffix));
        Ok(url)
    }

    /// `{api_base}/{spreadsheet_id}/values/{range}{suffix}`
    fn values_url(&self, range: &str, suffix: &str) -> Result<Url, StoreError> {
        let mut url = self.base_url()?;
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(self.config.api_base.clone()))?
            .pop_if_empty()
            .push(&self.config.spreadsheet_id)
            .push("values")
            .push(&format!("{}{}", range, suffix));
        Ok(url)
    }

    fn base_url(&self) -> Result<Url, StoreError> {
        Url::parse(&self.config.api_base).map_err(|e| StoreError::InvalidUrl(e.to_string()))
    }
}

/// Cell value as text; numbers are rendered, everything else is skipped
fn cell_text(cell: &Value) -> Option<String> {
    match cell {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_success<T: serde::de::DeserializeOwned + Default>(
    response: &HttpResponse,
) -> Result<T, StoreError> {
    if !response.is_success() {
        return Err(upstream_error(response));
    }
    if response.body.trim().is_empty() {
        return Ok(T::default());
    }
    response
        .parse()
        .map_err(|e| StoreError::InvalidResponse(e.to_string()))
}

/// Upstream error message: `error.message`, else the raw body, else the reason phrase
fn upstream_error(response: &HttpResponse) -> StoreError {
    let message = serde_json::from_str::<Value>(&response.body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .or_else(|| Some(response.body.trim().to_string()).filter(|b| !b.is_empty()))
        .unwrap_or_else(|| format!("{} {}", response.status, response.reason()));
    StoreError::Api(message)
}
