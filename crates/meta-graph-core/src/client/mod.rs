//! Graph API client for authenticated operations.
//!
//! This module provides the main [`GraphClient`] used by every higher-level
//! wrapper. Each call is admitted by the shared rate limiter, executed with
//! retry-on-transient-failure semantics, and any failure is normalized into
//! a [`GraphError`] before it reaches the caller.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GraphError, UpstreamErrorEnvelope, ValidationError};
use crate::rate_limit::{RateLimitConfig, RateLimiter};
use crate::retry::{RetryHandler, RetryPolicy};

/// Graph API version used when none is configured.
pub const DEFAULT_API_VERSION: &str = "v18.0";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for Graph API client behavior.
///
/// Owned exclusively by one [`GraphClient`]; the bearer token is attached at
/// construction and cannot change afterwards — build a new client for a new
/// token.
///
/// # Examples
///
/// ```
/// use meta_graph_core::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_api_version("v19.0")
///     .with_access_token("EAAB...")
///     .with_timeout(Duration::from_secs(60));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Graph API version, used to derive the base URL
    pub api_version: String,
    /// Full base URL override; when set, `api_version` is not used for URL
    /// construction. This is the seam tests use to point at a local server.
    pub base_url: Option<String>,
    /// Bearer token attached to every request
    pub access_token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    /// Rolling-window rate limit policy
    pub rate_limit: RateLimitConfig,
    /// Transient-failure retry policy
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_version: DEFAULT_API_VERSION.to_string(),
            base_url: None,
            access_token: None,
            timeout: DEFAULT_TIMEOUT,
            rate_limit: RateLimitConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Create a new builder for client configuration.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
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

    /// Set the bearer access token.
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the rate limit policy.
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Validate the configuration.
    ///
    /// Pure function — inspects the struct and reports the first problem
    /// without touching the network.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_version.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "api_version".to_string(),
            });
        }
        if !self.api_version.starts_with('v') {
            return Err(ValidationError::InvalidFormat {
                field: "api_version".to_string(),
                message: "expected a version string like \"v18.0\"".to_string(),
            });
        }
        if self.timeout.is_zero() {
            return Err(ValidationError::OutOfRange {
                field: "timeout".to_string(),
                message: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// The base URL requests are issued against.
    pub fn resolved_base_url(&self) -> String {
        match &self.base_url {
            Some(base_url) => base_url.trim_end_matches('/').to_string(),
            None => format!("https://graph.facebook.com/{}", self.api_version),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_version", &self.api_version)
            .field("base_url", &self.base_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("rate_limit", &self.rate_limit)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Builder for constructing [`ClientConfig`] instances.
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Create a new configuration builder with defaults.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// Set the Graph API version.
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.config.api_version = api_version.into();
        self
    }

    /// Override the base URL entirely.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = Some(base_url.into());
        self
    }

    /// Set the bearer access token.
    pub fn access_token(mut self, access_token: impl Into<String>) -> Self {
        self.config.access_token = Some(access_token.into());
        self
    }

    /// Set the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the rate limit policy.
    pub fn rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.config.rate_limit = rate_limit;
        self
    }

    /// Set the retry policy.
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `{"success": true}` acknowledgement returned by several Graph endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
}

/// Request body variants the transport can carry.
enum RequestBody {
    None,
    Json(serde_json::Value),
    Form(Vec<(String, String)>),
}

/// Graph API client: the HTTP transport facade.
///
/// Every call is admitted by the rate limiter and executed under the retry
/// policy — each retry attempt consumes its own rate-limit slot, with
/// admission always preceding the attempt it accounts for. Failures are
/// normalized into [`GraphError`] before they surface.
///
/// Cloning shares the rate-limit window, so wrappers built on clones of one
/// client draw from a single budget.
///
/// # Examples
///
/// ```rust,no_run
/// # use meta_graph_core::{ClientConfig, GraphClient};
/// # async fn example() -> Result<(), meta_graph_core::GraphError> {
/// let client = GraphClient::new(ClientConfig::default().with_access_token("EAAB..."))?;
/// let profile: serde_json::Value = client.get("/me", &[]).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    rate_limiter: RateLimiter,
    retry: RetryHandler,
    config: ClientConfig,
}

impl GraphClient {
    /// Create a client from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Validation`] when the configuration is invalid
    /// and [`GraphError::Configuration`] when the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: ClientConfig) -> Result<Self, GraphError> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.access_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                GraphError::Configuration {
                    message: "access token contains characters not valid in a header".to_string(),
                }
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| GraphError::Configuration {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: config.resolved_base_url(),
            rate_limiter: RateLimiter::new(config.rate_limit.clone()),
            retry: RetryHandler::new(config.retry.clone()),
            config,
        })
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The base URL requests are issued against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a GET request and parse the JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, GraphError> {
        self.request(Method::GET, path, params, RequestBody::None)
            .await
    }

    /// Issue a POST request with a JSON body and parse the JSON response.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
        params: &[(&str, &str)],
    ) -> Result<T, GraphError> {
        let body = serde_json::to_value(body)?;
        self.request(Method::POST, path, params, RequestBody::Json(body))
            .await
    }

    /// Issue a POST request with a form-encoded body and parse the JSON
    /// response.
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, GraphError> {
        let form = form
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        self.request(Method::POST, path, &[], RequestBody::Form(form))
            .await
    }

    /// Issue a DELETE request and parse the JSON response.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, GraphError> {
        self.request(Method::DELETE, path, params, RequestBody::None)
            .await
    }

    fn endpoint(&self, path: &str) -> String {
        let normalized = path.strip_prefix('/').unwrap_or(path);
        format!("{}/{}", self.base_url, normalized)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: RequestBody,
    ) -> Result<T, GraphError> {
        let url = self.endpoint(path);
        debug!(%method, %url, "issuing request");

        self.retry
            .execute(|| {
                let mut builder = self.http.request(method.clone(), url.as_str());
                if !params.is_empty() {
                    builder = builder.query(params);
                }
                builder = match &body {
                    RequestBody::None => builder,
                    RequestBody::Json(value) => builder.json(value),
                    RequestBody::Form(fields) => builder.form(fields),
                };
                async move {
                    self.rate_limiter.acquire().await;
                    let response = builder.send().await.map_err(GraphError::from_request)?;
                    deserialize_response(response).await
                }
            })
            .await
    }
}

impl std::fmt::Debug for GraphClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClient")
            .field("base_url", &self.base_url)
            .field("config", &self.config)
            .finish()
    }
}

async fn deserialize_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, GraphError> {
    let status = response.status();

    if status.is_success() {
        let bytes = response.bytes().await.map_err(GraphError::from_request)?;
        return Ok(serde_json::from_slice(&bytes)?);
    }

    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read error body".to_string());

    match serde_json::from_str::<UpstreamErrorEnvelope>(&text) {
        Ok(envelope) => Err(GraphError::from_upstream(status.as_u16(), envelope.error)),
        Err(_) => Err(GraphError::Http {
            status: status.as_u16(),
            message: if text.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string()
            } else {
                text
            },
        }),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
