//! Media client configuration and construction.

use meta_graph_core::{ClientConfig, GraphClient, GraphError, ValidationError, DEFAULT_API_VERSION};

/// Configuration for the media publishing client.
#[derive(Clone)]
pub struct MediaConfig {
    /// Bearer token with `instagram_content_publish` scope
    pub access_token: String,
    /// Instagram professional account id publishing is performed for
    pub ig_user_id: String,
    /// Graph API version
    pub api_version: String,
    /// Full base URL override (test seam)
    pub base_url: Option<String>,
}

impl MediaConfig {
    /// Create a configuration for one Instagram account.
    pub fn new(access_token: impl Into<String>, ig_user_id: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            ig_user_id: ig_user_id.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            base_url: None,
        }
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
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.access_token.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "access_token".to_string(),
            });
        }
        if self.ig_user_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "ig_user_id".to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for MediaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaConfig")
            .field("access_token", &"<redacted>")
            .field("ig_user_id", &self.ig_user_id)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Instagram media publishing client.
#[derive(Debug, Clone)]
pub struct MediaClient {
    pub(crate) http: GraphClient,
    pub(crate) ig_user_id: String,
}

impl MediaClient {
    /// Create a media client from a validated configuration.
    pub fn new(config: MediaConfig) -> Result<Self, GraphError> {
        config.validate()?;

        let mut client_config = ClientConfig::default()
            .with_api_version(config.api_version.clone())
            .with_access_token(config.access_token.clone());
        if let Some(base_url) = &config.base_url {
            client_config = client_config.with_base_url(base_url.clone());
        }
        let http = GraphClient::new(client_config)?;

        Ok(Self {
            http,
            ig_user_id: config.ig_user_id,
        })
    }
}
