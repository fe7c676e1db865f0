use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque bearer token returned by the identity service.
///
/// Always non-empty: an empty string can neither be constructed nor
/// deserialized, so a stored token is either absent or usable.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionToken(String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("session token must not be empty")]
pub struct EmptyToken;

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Result<Self, EmptyToken> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(EmptyToken);
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionToken {
    type Error = EmptyToken;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SessionToken> for String {
    fn from(token: SessionToken) -> Self {
        token.0
    }
}

// Tokens end up in logs via `{:?}` on containing structs; keep them out.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken(<{} chars>)", self.0.len())
    }
}

/// Credentials gathered for a single command. Never persisted.
#[derive(Clone)]
pub struct CredentialInput {
    pub identifier: String,
    pub secret: Option<String>,
}

impl CredentialInput {
    /// Email only, as used by account creation
    pub fn identifier(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: None,
        }
    }

    /// Email and password, as used by login
    pub fn with_secret(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: Some(secret.into()),
        }
    }
}

impl fmt::Debug for CredentialInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialInput")
            .field("identifier", &self.identifier)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
