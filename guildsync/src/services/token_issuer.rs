//! OAuth token issuance for the spreadsheet service
//!
//! Builds an RS256-signed assertion for the service account and exchanges it
//! at the token endpoint using the JWT-bearer grant. Every sync issues a fresh
//! token; nothing is cached.

use guildsync_common::Clock;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::http::{HttpRequest, HttpTransport, TransportError};
use crate::models::Credentials;

pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

/// Write scope requested for the spreadsheet service
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Assertion validity window
pub const ASSERTION_LIFETIME_SECS: i64 = 3600;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Token issuance errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid credentials format")]
    InvalidCredentials,

    #[error("Failed to sign assertion: {0}")]
    Signing(String),

    #[error("OAuth failed: {status} {reason}")]
    OAuthFailed { status: u16, reason: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid token response: {0}")]
    InvalidResponse(String),
}

impl From<TransportError> for TokenError {
    fn from(e: TransportError) -> Self {
        TokenError::Network(e.to_string())
    }
}

/// Claims of the signed assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Successful token endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    #[allow(dead_code)]
    expires_in: Option<u64>,
}

/// Short-lived access token, presented as `Authorization: Bearer ...`
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Exchanges service-account credentials for bearer tokens
pub struct TokenIssuer {
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    token_endpoint: String,
}

impl TokenIssuer {
    pub fn new(transport: Arc<dyn HttpTransport>, clock: Arc<dyn Clock>) -> Self {
        Self {
            transport,
            clock,
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, token_endpoint: impl Into<String>) -> Self {
        self.token_endpoint = token_endpoint.into();
        self
    }

    /// Claims for an assertion issued now
    pub fn build_claims(&self, credentials: &Credentials) -> AssertionClaims {
        let iat = self.clock.now().timestamp();
        AssertionClaims {
            iss: credentials.client_email.clone(),
            scope: SPREADSHEETS_SCOPE.to_string(),
            aud: self.token_endpoint.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        }
    }

    /// Sign the assertion with the credentials' private key (RS256)
    pub fn sign_assertion(&self, credentials: &Credentials) -> Result<String, TokenError> {
        let key = EncodingKey::from_rsa_pem(credentials.private_key.as_bytes())
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        let claims = self.build_claims(credentials);

        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Issue a fresh bearer token
    ///
    /// Malformed credentials fail before any network call.
    pub async fn issue_token(&self, credentials: &Credentials) -> Result<BearerToken, TokenError> {
        if !credentials.is_well_formed() {
            return Err(TokenError::InvalidCredentials);
        }

        let assertion = self.sign_assertion(credentials)?;

        debug!(
            issuer = %credentials.client_email,
            endpoint = %self.token_endpoint,
            "Exchanging assertion for access token"
        );

        let request = HttpRequest::post(&self.token_endpoint).form(vec![
            ("grant_type".to_string(), JWT_BEARER_GRANT.to_string()),
            ("assertion".to_string(), assertion),
        ]);

        let response = self.transport.send(request).await?;

        if !response.is_success() {
            return Err(TokenError::OAuthFailed {
                status: response.status,
                reason: response.reason().to_string(),
            });
        }

        let token: TokenResponse = response
            .parse()
            .map_err(|e| TokenError::InvalidResponse(e.to_string()))?;

        info!(issuer = %credentials.client_email, "Access token issued");

        Ok(BearerToken(token.access_token))
    }
}
