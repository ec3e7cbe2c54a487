//! Messaging client: thin argument-to-request mappers over the transport.

use serde_json::{json, Value};

use meta_graph_core::{
    ClientConfig, GraphClient, GraphError, SuccessResponse, ValidationError, DEFAULT_API_VERSION,
};

use crate::types::{InteractiveButton, ListSection, MediaInfo, SendMessageResponse};

const MAX_INTERACTIVE_BUTTONS: usize = 3;
const MAX_LIST_SECTIONS: usize = 10;

/// Configuration for the messaging client.
#[derive(Clone)]
pub struct MessagingConfig {
    /// Bearer token for the WhatsApp Business account
    pub access_token: String,
    /// Phone number the messages are sent from
    pub phone_number_id: String,
    /// Business account id, needed for template management
    pub business_account_id: Option<String>,
    /// Graph API version
    pub api_version: String,
    /// Full base URL override (test seam)
    pub base_url: Option<String>,
}

impl MessagingConfig {
    /// Create a configuration for one sending phone number.
    pub fn new(access_token: impl Into<String>, phone_number_id: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            phone_number_id: phone_number_id.into(),
            business_account_id: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            base_url: None,
        }
    }

    /// Set the business account id.
    pub fn with_business_account_id(mut self, business_account_id: impl Into<String>) -> Self {
        self.business_account_id = Some(business_account_id.into());
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
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.access_token.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "access_token".to_string(),
            });
        }
        if self.phone_number_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "phone_number_id".to_string(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for MessagingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagingConfig")
            .field("access_token", &"<redacted>")
            .field("phone_number_id", &self.phone_number_id)
            .field("business_account_id", &self.business_account_id)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// WhatsApp Business messaging client.
///
/// All senders go through one [`GraphClient`], sharing its rate-limit
/// budget and retry policy.
///
/// # Examples
///
/// ```rust,no_run
/// use meta_graph_messaging::{MessagingClient, MessagingConfig};
///
/// # async fn example() -> Result<(), meta_graph_core::GraphError> {
/// let client = MessagingClient::new(MessagingConfig::new("EAAB...", "15551234567"))?;
/// let response = client.send_text("15557654321", "hello", false).await?;
/// println!("accepted as {:?}", response.message_id());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MessagingClient {
    http: GraphClient,
    phone_number_id: String,
}

impl MessagingClient {
    /// Create a messaging client from a validated configuration.
    pub fn new(config: MessagingConfig) -> Result<Self, GraphError> {
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
            phone_number_id: config.phone_number_id,
        })
    }

    /// Send a plain text message.
    pub async fn send_text(
        &self,
        to: &str,
        body: &str,
        preview_url: bool,
    ) -> Result<SendMessageResponse, GraphError> {
        self.send(json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "text",
            "text": {"body": body, "preview_url": preview_url}
        }))
        .await
    }

    /// Send an image by URL with an optional caption.
    pub async fn send_image(
        &self,
        to: &str,
        image_url: &str,
        caption: Option<&str>,
    ) -> Result<SendMessageResponse, GraphError> {
        let mut image = json!({"link": image_url});
        if let Some(caption) = caption {
            image["caption"] = Value::String(caption.to_string());
        }
        self.send(json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "image",
            "image": image
        }))
        .await
    }

    /// Send a pre-approved template message.
    pub async fn send_template(
        &self,
        to: &str,
        template_name: &str,
        language: &str,
        components: Option<Value>,
    ) -> Result<SendMessageResponse, GraphError> {
        let mut template = json!({
            "name": template_name,
            "language": {"code": language}
        });
        if let Some(components) = components {
            template["components"] = components;
        }
        self.send(json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "template",
            "template": template
        }))
        .await
    }

    /// Send an interactive reply-button message.
    ///
    /// # Errors
    ///
    /// Fails with [`GraphError::Validation`] before any network call when
    /// there are no buttons or more than three.
    pub async fn send_interactive_buttons(
        &self,
        to: &str,
        body: &str,
        buttons: &[InteractiveButton],
    ) -> Result<SendMessageResponse, GraphError> {
        if buttons.is_empty() || buttons.len() > MAX_INTERACTIVE_BUTTONS {
            return Err(ValidationError::OutOfRange {
                field: "buttons".to_string(),
                message: format!(
                    "interactive messages carry between 1 and {MAX_INTERACTIVE_BUTTONS} buttons"
                ),
            }
            .into());
        }

        let buttons: Vec<Value> = buttons
            .iter()
            .map(|button| {
                json!({
                    "type": "reply",
                    "reply": {"id": button.id, "title": button.title}
                })
            })
            .collect();

        self.send(json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "interactive",
            "interactive": {
                "type": "button",
                "body": {"text": body},
                "action": {"buttons": buttons}
            }
        }))
        .await
    }

    /// Send an interactive list message.
    ///
    /// # Errors
    ///
    /// Fails with [`GraphError::Validation`] before any network call when
    /// there are no sections or more than ten.
    pub async fn send_interactive_list(
        &self,
        to: &str,
        body: &str,
        button_label: &str,
        sections: &[ListSection],
    ) -> Result<SendMessageResponse, GraphError> {
        if sections.is_empty() || sections.len() > MAX_LIST_SECTIONS {
            return Err(ValidationError::OutOfRange {
                field: "sections".to_string(),
                message: format!(
                    "list messages carry between 1 and {MAX_LIST_SECTIONS} sections"
                ),
            }
            .into());
        }

        self.send(json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
            "type": "interactive",
            "interactive": {
                "type": "list",
                "body": {"text": body},
                "action": {"button": button_label, "sections": sections}
            }
        }))
        .await
    }

    /// Mark an incoming message as read.
    pub async fn mark_as_read(&self, message_id: &str) -> Result<SuccessResponse, GraphError> {
        self.http
            .post(
                &self.messages_path(),
                &json!({
                    "messaging_product": "whatsapp",
                    "status": "read",
                    "message_id": message_id
                }),
                &[],
            )
            .await
    }

    /// Resolve a media id to its (short-lived) download URL and metadata.
    pub async fn media_info(&self, media_id: &str) -> Result<MediaInfo, GraphError> {
        self.http.get(&format!("/{media_id}"), &[]).await
    }

    async fn send(&self, payload: Value) -> Result<SendMessageResponse, GraphError> {
        self.http.post(&self.messages_path(), &payload, &[]).await
    }

    fn messages_path(&self) -> String {
        format!("/{}/messages", self.phone_number_id)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
