//! OAuth endpoints client.
//!
//! Wraps the Graph API's token endpoints: code-for-token exchange,
//! short-to-long-lived exchange, introspection, revocation, and the
//! authorization dialog URL with CSRF state. All requests go through the
//! core transport, so they share its rate limiting, retry, and error
//! normalization.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;

use meta_graph_core::{
    ClientConfig, GraphClient, GraphError, Paged, ValidationError, DEFAULT_API_VERSION,
};

use crate::types::{
    DebugTokenResponse, PageAccessToken, TokenExchangeResponse, TokenValidation,
};

/// Tokens with more than this many days of life left are returned as-is by
/// [`AuthClient::refresh_token`] instead of being exchanged again.
const REFRESH_SHORT_CIRCUIT_DAYS: i64 = 7;

/// Configuration for the OAuth client.
#[derive(Clone)]
pub struct AuthConfig {
    /// App identifier from the developer console
    pub app_id: String,
    /// App secret; combined with the id it forms the app-pair credential
    pub app_secret: String,
    /// Default redirect URI for exchanges and authorization URLs
    pub redirect_uri: Option<String>,
    /// Graph API version
    pub api_version: String,
    /// Full base URL override (test seam)
    pub base_url: Option<String>,
}

impl AuthConfig {
    /// Create a configuration from the app-pair credential.
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            redirect_uri: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            base_url: None,
        }
    }

    /// Set the default redirect URI.
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(redirect_uri.into());
        self
    }

    /// Set the Graph API version.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Override the base URL entirely.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Validate the configuration.
    ///
    /// Pure function — reports the first problem without touching the
    /// network.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.app_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "app_id".to_string(),
            });
        }
        if self.app_secret.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "app_secret".to_string(),
            });
        }
        if self.api_version.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "api_version".to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Client for the Graph API OAuth endpoints.
///
/// Authenticates with the app-pair credential (`app_id|app_secret`) passed
/// as a query parameter, as the token endpoints require — no bearer header
/// is attached.
#[derive(Debug, Clone)]
pub struct AuthClient {
    config: AuthConfig,
    http: GraphClient,
}

impl AuthClient {
    /// Create an OAuth client from a validated configuration.
    pub fn new(config: AuthConfig) -> Result<Self, GraphError> {
        config.validate()?;

        let mut client_config =
            ClientConfig::default().with_api_version(config.api_version.clone());
        if let Some(base_url) = &config.base_url {
            client_config = client_config.with_base_url(base_url.clone());
        }
        let http = GraphClient::new(client_config)?;

        Ok(Self { config, http })
    }

    /// Get the configuration.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Exchange an authorization code for an access token.
    ///
    /// `redirect_uri` must match the one used in the authorization request;
    /// falls back to the configured default.
    pub async fn exchange_code_for_token(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
    ) -> Result<TokenExchangeResponse, GraphError> {
        let redirect = redirect_uri
            .or(self.config.redirect_uri.as_deref())
            .ok_or_else(|| ValidationError::Required {
                field: "redirect_uri".to_string(),
            })?;

        self.http
            .get(
                "/oauth/access_token",
                &[
                    ("client_id", self.config.app_id.as_str()),
                    ("client_secret", self.config.app_secret.as_str()),
                    ("redirect_uri", redirect),
                    ("code", code),
                ],
            )
            .await
    }

    /// Exchange a short-lived token for a long-lived one (about 60 days).
    pub async fn exchange_for_long_lived_token(
        &self,
        short_lived_token: &str,
    ) -> Result<TokenExchangeResponse, GraphError> {
        self.http
            .get(
                "/oauth/access_token",
                &[
                    ("grant_type", "fb_exchange_token"),
                    ("client_id", self.config.app_id.as_str()),
                    ("client_secret", self.config.app_secret.as_str()),
                    ("fb_exchange_token", short_lived_token),
                ],
            )
            .await
    }

    /// Refresh a long-lived token, extending its life by about 60 days.
    ///
    /// Introspects the token first: an invalid token is a hard error, and a
    /// token with more than seven days of life left is returned unchanged
    /// with a synthesized `expires_in` rather than burning an exchange.
    pub async fn refresh_token(&self, token: &str) -> Result<TokenExchangeResponse, GraphError> {
        let debug = self.debug_token(token).await?;

        if !debug.data.is_valid {
            return Err(ValidationError::InvalidFormat {
                field: "access_token".to_string(),
                message: "token is invalid and cannot be refreshed".to_string(),
            }
            .into());
        }

        if let Some(expires_at) = expiry_timestamp(debug.data.expires_at) {
            let days_left = (expires_at - Utc::now()).num_days();
            if days_left > REFRESH_SHORT_CIRCUIT_DAYS {
                return Ok(TokenExchangeResponse {
                    access_token: token.to_string(),
                    token_type: Some("bearer".to_string()),
                    expires_in: Some(days_left * 86_400),
                });
            }
        }

        self.exchange_for_long_lived_token(token).await
    }

    /// Introspect a token via `/debug_token`.
    ///
    /// Authenticated with the app-pair credential.
    pub async fn debug_token(&self, token: &str) -> Result<DebugTokenResponse, GraphError> {
        let app_token = self.app_access_token();
        self.http
            .get(
                "/debug_token",
                &[("input_token", token), ("access_token", app_token.as_str())],
            )
            .await
    }

    /// Validate a token and return detailed information.
    ///
    /// Never fails: introspection errors, platform-side invalidity, and
    /// expiry all produce `valid: false` with the reason in `error`.
    pub async fn validate_token(&self, token: &str) -> TokenValidation {
        let debug = match self.debug_token(token).await {
            Ok(debug) => debug,
            Err(error) => return TokenValidation::invalid(error.to_string()),
        };

        let data = debug.data;
        if !data.is_valid {
            return TokenValidation::invalid("token is invalid");
        }

        let expires_at = expiry_timestamp(data.expires_at);
        if let Some(at) = expires_at {
            if at <= Utc::now() {
                return TokenValidation::invalid("token has expired");
            }
        }

        TokenValidation {
            valid: true,
            expires_at,
            scopes: data.scopes.unwrap_or_default(),
            user_id: data.user_id,
            app_id: data.app_id,
            error: None,
        }
    }

    /// List the pages a user manages with their page access tokens.
    pub async fn get_page_access_tokens(
        &self,
        user_access_token: &str,
    ) -> Result<Vec<PageAccessToken>, GraphError> {
        let page: Paged<PageAccessToken> = self
            .http
            .get("/me/accounts", &[("access_token", user_access_token)])
            .await?;
        Ok(page.data)
    }

    /// Get a long-lived page access token.
    ///
    /// Exchanges the user token for a long-lived one first; the page token
    /// fetched with it does not expire.
    pub async fn get_long_lived_page_token(
        &self,
        page_id: &str,
        user_access_token: &str,
    ) -> Result<String, GraphError> {
        #[derive(Deserialize)]
        struct PageTokenField {
            access_token: String,
        }

        let long_lived = self.exchange_for_long_lived_token(user_access_token).await?;
        let response: PageTokenField = self
            .http
            .get(
                &format!("/{page_id}"),
                &[
                    ("fields", "access_token"),
                    ("access_token", long_lived.access_token.as_str()),
                ],
            )
            .await?;
        Ok(response.access_token)
    }

    /// Revoke a token by deleting its permission grants.
    pub async fn revoke_token(&self, token: &str) -> Result<(), GraphError> {
        #[derive(Deserialize)]
        struct RevokeResponse {
            #[serde(default)]
            #[allow(dead_code)]
            success: bool,
        }

        let _: RevokeResponse = self
            .http
            .delete("/me/permissions", &[("access_token", token)])
            .await?;
        Ok(())
    }

    /// The app-pair credential used for server-to-server calls.
    pub fn app_access_token(&self) -> String {
        format!("{}|{}", self.config.app_id, self.config.app_secret)
    }

    /// Generate a CSRF state parameter: 32 random bytes, hex-encoded.
    pub fn generate_state() -> String {
        use rand::RngCore;
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Check a returned state parameter against the locally generated one.
    ///
    /// Exact-match comparison; any mismatch means the redirect must be
    /// rejected.
    pub fn verify_state(expected: &str, returned: &str) -> bool {
        !expected.is_empty() && expected == returned
    }

    /// Build the authorization dialog URL.
    ///
    /// Scopes are comma-joined; `state` defaults to a freshly generated
    /// value, which the caller must remember for [`verify_state`].
    ///
    /// [`verify_state`]: AuthClient::verify_state
    pub fn authorization_url(
        &self,
        scopes: &[&str],
        state: Option<&str>,
        redirect_uri: Option<&str>,
    ) -> Result<String, GraphError> {
        let redirect = redirect_uri
            .or(self.config.redirect_uri.as_deref())
            .ok_or_else(|| ValidationError::Required {
                field: "redirect_uri".to_string(),
            })?;

        let generated;
        let state = match state {
            Some(state) => state,
            None => {
                generated = Self::generate_state();
                &generated
            }
        };

        let mut url = Url::parse(&format!(
            "https://www.facebook.com/{}/dialog/oauth",
            self.config.api_version
        ))
        .map_err(|e| GraphError::Configuration {
            message: format!("failed to build authorization URL: {e}"),
        })?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.config.app_id)
            .append_pair("redirect_uri", redirect)
            .append_pair("scope", &scopes.join(","))
            .append_pair("state", state)
            .append_pair("response_type", "code");

        Ok(url.into())
    }
}

fn expiry_timestamp(expires_at: Option<i64>) -> Option<DateTime<Utc>> {
    // The platform reports 0 for tokens that never expire.
    expires_at
        .filter(|&seconds| seconds > 0)
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
