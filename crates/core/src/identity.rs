//! Credential decoding and user identity.
//!
//! The credential is an opaque signed token issued by the auth endpoint.
//! Only its claims segment is read here; the signature belongs to the server.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::error::{AuthErrorCode, Error, Result};
use crate::limits::CREDENTIAL_PATTERN;

/// Compiled credential regex (lazy initialization).
static CREDENTIAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CREDENTIAL_PATTERN).expect("invalid credential pattern"));

/// Claims carried by the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Expiry, epoch seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Decoded credential. Keeps the raw token for bearer headers.
#[derive(Clone)]
pub struct Credential {
    raw: String,
    claims: TokenClaims,
}

impl Credential {
    /// Decode a credential string.
    ///
    /// Fails with AUTH_001 when empty and AUTH_002 when the shape or the
    /// claims segment is invalid.
    pub fn decode(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::auth(
                AuthErrorCode::MissingCredential,
                "credential is required",
            ));
        }

        if !CREDENTIAL_REGEX.is_match(raw) {
            return Err(Error::auth(
                AuthErrorCode::InvalidCredential,
                "invalid credential format",
            ));
        }

        // Regex guarantees three segments
        let payload = raw.split('.').nth(1).unwrap_or_default();
        let bytes = URL_SAFE_NO_PAD.decode(payload).map_err(|e| {
            Error::auth(
                AuthErrorCode::InvalidCredential,
                format!("credential payload is not base64url: {}", e),
            )
        })?;

        let claims: TokenClaims = serde_json::from_slice(&bytes).map_err(|e| {
            Error::auth(
                AuthErrorCode::InvalidCredential,
                format!("credential claims are invalid: {}", e),
            )
        })?;

        if claims.username.trim().is_empty() {
            return Err(Error::auth(
                AuthErrorCode::InvalidCredential,
                "credential has no username",
            ));
        }

        Ok(Self {
            raw: raw.to_string(),
            claims,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }

    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            username: self.claims.username.clone(),
            name: self.claims.name.clone(),
            email: self.claims.email.clone(),
        }
    }

    /// True when the credential carries an `exp` at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.claims
            .exp
            .is_some_and(|exp| exp <= now.timestamp())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.claims.username)
            .field("exp", &self.claims.exp)
            .finish_non_exhaustive()
    }
}

/// Identity derived from the credential. Never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub username: String,
    pub name: String,
    pub email: String,
}

/// An authenticated caller: identity plus the credential it came from.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub identity: UserIdentity,
    pub credential: Credential,
}

impl AuthenticatedUser {
    pub fn new(credential: Credential) -> Self {
        Self {
            identity: credential.identity(),
            credential,
        }
    }

    pub fn username(&self) -> &str {
        &self.identity.username
    }

    /// Value for an `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.credential.as_str())
    }
}

/// Extract a credential from an `Authorization: Bearer <token>` header.
pub fn extract_bearer(auth_header: Option<&str>) -> Result<Credential> {
    match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => Credential::decode(token),
        None => Err(Error::auth(
            AuthErrorCode::MissingCredential,
            "credential is required",
        )),
    }
}
