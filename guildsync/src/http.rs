//! Outbound HTTP transport
//!
//! Every component talks to the network through [`HttpTransport`], which is
//! passed in at construction. Production code uses [`ReqwestTransport`];
//! tests substitute a scripted transport.

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("guildsync/", env!("CARGO_PKG_VERSION"));

/// Transport-level failures (no HTTP status was received)
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to build HTTP client: {0}")]
    Build(String),
}

/// Request body variants used by the pipeline
#[derive(Clone, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Form(Vec<(String, String)>),
}

/// Outbound request
#[derive(Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = Some(RequestBody::Form(fields));
        self
    }

    /// Header value by case-insensitive name
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Query parameter value from the URL
    pub fn query_param(&self, name: &str) -> Option<String> {
        let url = reqwest::Url::parse(&self.url).ok()?;
        let value = url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned());
        value
    }

    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            Some(RequestBody::Json(v)) => Some(v),
            _ => None,
        }
    }

    pub fn form_value(&self, name: &str) -> Option<&str> {
        match &self.body {
            Some(RequestBody::Form(fields)) => fields
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

// Headers and bodies carry tokens and signed assertions; webhook URLs
// carry the interaction token as their last path segment
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &redacted_url(&self.url))
            .finish_non_exhaustive()
    }
}

/// URL with every path segment after `webhooks/{application_id}` masked
fn redacted_url(url: &str) -> String {
    let Ok(mut parsed) = reqwest::Url::parse(url) else {
        return "<unparseable>".to_string();
    };

    let Some(segments) = parsed
        .path_segments()
        .map(|s| s.map(str::to_string).collect::<Vec<_>>())
    else {
        return parsed.to_string();
    };
    let Some(hook) = segments.iter().position(|s| s == "webhooks") else {
        return parsed.to_string();
    };
    if segments.len() <= hook + 2 {
        return parsed.to_string();
    }

    if let Ok(mut path) = parsed.path_segments_mut() {
        path.clear().extend(&segments[..hook + 2]).push("<redacted>");
    }
    parsed.set_query(None);
    parsed.to_string()
}

/// Response status and raw body text
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Canonical reason phrase for the status code ("Forbidden", ...)
    pub fn reason(&self) -> &'static str {
        reqwest::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown")
    }
}

/// Sends one HTTP request and returns the raw response
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Production transport backed by reqwest
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.request(request.method, &request.url);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        builder = match request.body {
            Some(RequestBody::Json(body)) => builder.json(&body),
            Some(RequestBody::Form(fields)) => builder.form(&fields),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_creation() {
        assert!(ReqwestTransport::new().is_ok());
    }

    #[test]
    fn test_query_param_lookup() {
        let request = HttpRequest::get("https://example.com/guilds/1/members?limit=1000&after=42");
        assert_eq!(request.query_param("limit").as_deref(), Some("1000"));
        assert_eq!(request.query_param("after").as_deref(), Some("42"));
        assert_eq!(request.query_param("missing"), None);
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let request = HttpRequest::get("https://example.com").header("Authorization", "Bot abc");
        assert_eq!(request.header_value("authorization"), Some("Bot abc"));
    }

    #[test]
    fn test_debug_hides_headers_and_body() {
        let request = HttpRequest::post("https://example.com/token")
            .header("Authorization", "Bearer secret-token")
            .form(vec![("assertion".to_string(), "signed.jwt.value".to_string())]);

        let debug = format!("{:?}", request);
        assert!(!debug.contains("secret-token"));
        assert!(!debug.contains("signed.jwt.value"));
    }

    #[test]
    fn test_debug_masks_webhook_token() {
        let request = HttpRequest::post(
            "https://discord.test/api/v10/webhooks/555555555555555555/interaction-token-abc?wait=true",
        );

        let debug = format!("{:?}", request);
        assert!(!debug.contains("interaction-token-abc"));
        assert!(debug.contains("/webhooks/555555555555555555/%3Credacted%3E"));
    }

    #[test]
    fn test_debug_keeps_ordinary_urls() {
        let request = HttpRequest::get("https://discord.test/api/v10/guilds/1/members?limit=1000");
        let debug = format!("{:?}", request);
        assert!(debug.contains("https://discord.test/api/v10/guilds/1/members?limit=1000"));

        let bare = HttpRequest::get("https://discord.test/api/v10/webhooks/555");
        assert!(format!("{:?}", bare).contains("/webhooks/555"));
    }

    #[test]
    fn test_response_reason_and_success() {
        let ok = HttpResponse::json(200, &json!([]));
        assert!(ok.is_success());

        let forbidden = HttpResponse::new(403, "{}");
        assert!(!forbidden.is_success());
        assert_eq!(forbidden.reason(), "Forbidden");
    }
}
