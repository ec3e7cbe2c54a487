//! Pages client configuration and construction.

use meta_graph_core::{ClientConfig, GraphClient, GraphError, ValidationError, DEFAULT_API_VERSION};

/// Configuration for the pages client.
#[derive(Clone)]
pub struct PagesConfig {
    /// Page access token (not a user token)
    pub access_token: String,
    /// Id of the managed page
    pub page_id: String,
    /// Graph API version
    pub api_version: String,
    /// Full base URL override (test seam)
    pub base_url: Option<String>,
}

impl PagesConfig {
    /// Create a configuration for one managed page.
    pub fn new(access_token: impl Into<String>, page_id: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            page_id: page_id.into(),
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
        if self.page_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "page_id".to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for PagesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagesConfig")
            .field("access_token", &"<redacted>")
            .field("page_id", &self.page_id)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Facebook Page management client.
///
/// Posts, comments, and insights all issue their requests through one
/// shared transport, drawing from a single rate-limit budget.
#[derive(Debug, Clone)]
pub struct PagesClient {
    pub(crate) http: GraphClient,
    pub(crate) page_id: String,
}

impl PagesClient {
    /// Create a pages client from a validated configuration.
    pub fn new(config: PagesConfig) -> Result<Self, GraphError> {
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
            page_id: config.page_id,
        })
    }

    /// Id of the managed page.
    pub fn page_id(&self) -> &str {
        &self.page_id
    }
}
