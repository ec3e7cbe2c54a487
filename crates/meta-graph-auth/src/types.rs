//! Wire and domain types for the OAuth token lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response from the `/oauth/access_token` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenExchangeResponse {
    /// The issued bearer token.
    pub access_token: String,

    /// Token type, normally `"bearer"`.
    #[serde(default)]
    pub token_type: Option<String>,

    /// Seconds until the token expires, when the platform reports one.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Response from the `/debug_token` introspection endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DebugTokenResponse {
    pub data: DebugTokenData,
}

/// Introspection payload describing a token.
#[derive(Debug, Clone, Deserialize)]
pub struct DebugTokenData {
    /// App the token was issued to.
    #[serde(default)]
    pub app_id: Option<String>,

    /// Whether the platform still considers the token valid.
    pub is_valid: bool,

    /// Unix expiry timestamp; `0` means the token never expires.
    #[serde(default)]
    pub expires_at: Option<i64>,

    /// Granted permission scopes.
    #[serde(default)]
    pub scopes: Option<Vec<String>>,

    /// User the token acts on behalf of.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Outcome of validating a token via introspection.
///
/// Validation never fails with an error — any failure to introspect makes
/// the token invalid, with the reason carried in `error`.
#[derive(Debug, Clone)]
pub struct TokenValidation {
    pub valid: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub scopes: Vec<String>,
    pub user_id: Option<String>,
    pub app_id: Option<String>,
    pub error: Option<String>,
}

impl TokenValidation {
    /// An invalid outcome with the given reason.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            expires_at: None,
            scopes: Vec::new(),
            user_id: None,
            app_id: None,
            error: Some(reason.into()),
        }
    }
}

/// A page and its access token, from `/me/accounts`.
#[derive(Debug, Clone, Deserialize)]
pub struct PageAccessToken {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub access_token: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// Metadata persisted alongside a stored token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredTokenMetadata {
    pub expires_at: Option<DateTime<Utc>>,
    pub scopes: Vec<String>,
    pub user_id: Option<String>,
}
