//! Service-account credentials

use serde::Deserialize;
use std::fmt;

const PEM_BEGIN: &str = "-----BEGIN";
const PEM_PRIVATE_KEY: &str = "PRIVATE KEY-----";

/// Issuer identity and private signing key
///
/// Never logged: `Debug` redacts the key.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub client_email: String,
    pub private_key: String,
}

impl Credentials {
    /// Build credentials, turning literal `\n` escapes in the key into newlines
    pub fn new(client_email: impl Into<String>, private_key: impl Into<String>) -> Self {
        let private_key: String = private_key.into();
        Self {
            client_email: client_email.into().trim().to_string(),
            private_key: private_key.replace("\\n", "\n"),
        }
    }

    /// Format check only: non-empty identity and a PEM-encoded private key
    pub fn is_well_formed(&self) -> bool {
        !self.client_email.trim().is_empty()
            && !self.private_key.trim().is_empty()
            && self.private_key.contains(PEM_BEGIN)
            && self.private_key.contains(PEM_PRIVATE_KEY)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .finish()
    }
}
