//! Webhook verification and event fan-out for messaging.
//!
//! Deliveries arrive as POSTs signed with `X-Hub-Signature-256`; endpoint
//! ownership is proven once via the `hub.challenge` handshake. The
//! [`WebhookVerifier`] wraps the core crypto for both, and the
//! [`WebhookHandler`] dispatches parsed events to registered callbacks.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use tracing::debug;

use meta_graph_core::webhook::{subscription_challenge, verify_signature};
use meta_graph_core::{GraphError, ValidationError};

use crate::types::WebhookMetadata;

/// Verifies webhook endpoint subscriptions and delivery signatures.
#[derive(Clone)]
pub struct WebhookVerifier {
    app_secret: String,
    verify_token: String,
}

impl WebhookVerifier {
    /// Create a verifier from the app secret and the configured verify
    /// token.
    pub fn new(app_secret: impl Into<String>, verify_token: impl Into<String>) -> Self {
        Self {
            app_secret: app_secret.into(),
            verify_token: verify_token.into(),
        }
    }

    /// Answer the subscription handshake.
    ///
    /// Returns the challenge to echo with a 200 iff the mode is
    /// `subscribe` and the token matches; `None` means respond 403.
    pub fn handshake<'a>(&self, mode: &str, token: &str, challenge: &'a str) -> Option<&'a str> {
        subscription_challenge(mode, token, challenge, &self.verify_token)
    }

    /// Check a delivery signature against the exact raw request body.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` — authentic delivery
    /// * `Ok(false)` — signature mismatch; respond 401
    /// * `Err` — header absent or malformed; respond 401
    pub fn verify_payload(
        &self,
        payload: &[u8],
        signature_header: Option<&str>,
    ) -> Result<bool, GraphError> {
        let header = signature_header.ok_or_else(|| ValidationError::InvalidSignatureFormat {
            message: "missing X-Hub-Signature-256 header".to_string(),
        })?;
        Ok(verify_signature(payload, header, &self.app_secret)?)
    }
}

// Secrets stay out of debug output
impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("app_secret", &"<redacted>")
            .field("verify_token", &"<redacted>")
            .finish()
    }
}

type EventCallback = Arc<dyn Fn(Value, WebhookMetadata) -> BoxFuture<'static, ()> + Send + Sync>;
type ErrorCallback = Arc<dyn Fn(&GraphError) + Send + Sync>;

/// Fans webhook deliveries out to registered callbacks.
///
/// Message payloads pass through as raw JSON — the SDK types only the
/// envelope. Callbacks run sequentially in arrival order.
///
/// # Examples
///
/// ```rust,no_run
/// use meta_graph_messaging::WebhookHandler;
///
/// # async fn example(body: serde_json::Value) -> Result<(), meta_graph_core::GraphError> {
/// let handler = WebhookHandler::new()
///     .on_message(|message, metadata| async move {
///         println!("message via {}: {}", metadata.phone_number_id, message);
///     });
///
/// handler.process(&body).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct WebhookHandler {
    on_message: Option<EventCallback>,
    on_status: Option<EventCallback>,
    on_error: Option<ErrorCallback>,
}

impl WebhookHandler {
    /// Create a handler with no callbacks registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for incoming messages.
    pub fn on_message<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(Value, WebhookMetadata) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        self.on_message = Some(Arc::new(move |message, metadata| {
            Box::pin(callback(message, metadata))
        }));
        self
    }

    /// Register a callback for message status updates.
    pub fn on_status<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(Value, WebhookMetadata) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        self.on_status = Some(Arc::new(move |status, metadata| {
            Box::pin(callback(status, metadata))
        }));
        self
    }

    /// Register a callback for processing errors.
    ///
    /// With no error callback registered, processing errors propagate to
    /// the caller of [`process`].
    ///
    /// [`process`]: WebhookHandler::process
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&GraphError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(callback));
        self
    }

    /// Process one webhook delivery body.
    ///
    /// Deliveries for other webhook objects are ignored. Entries missing
    /// their metadata envelope are reported through the error callback (or
    /// returned, when none is registered) without aborting the remaining
    /// entries.
    pub async fn process(&self, body: &Value) -> Result<(), GraphError> {
        if body["object"] != "whatsapp_business_account" {
            debug!(object = %body["object"], "ignoring webhook for foreign object");
            return Ok(());
        }

        let empty = Vec::new();
        for entry in body["entry"].as_array().unwrap_or(&empty) {
            for change in entry["changes"].as_array().unwrap_or(&empty) {
                if change["field"] != "messages" {
                    continue;
                }

                let value = &change["value"];
                let metadata: WebhookMetadata =
                    match serde_json::from_value(value["metadata"].clone()) {
                        Ok(metadata) => metadata,
                        Err(error) => {
                            self.report(GraphError::Json(error))?;
                            continue;
                        }
                    };

                if let Some(on_message) = &self.on_message {
                    for message in value["messages"].as_array().unwrap_or(&empty) {
                        on_message(message.clone(), metadata.clone()).await;
                    }
                }

                if let Some(on_status) = &self.on_status {
                    for status in value["statuses"].as_array().unwrap_or(&empty) {
                        on_status(status.clone(), metadata.clone()).await;
                    }
                }
            }
        }

        Ok(())
    }

    fn report(&self, error: GraphError) -> Result<(), GraphError> {
        match &self.on_error {
            Some(on_error) => {
                on_error(&error);
                Ok(())
            }
            None => Err(error),
        }
    }
}

impl std::fmt::Debug for WebhookHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookHandler")
            .field("on_message", &self.on_message.as_ref().map(|_| "<callback>"))
            .field("on_status", &self.on_status.as_ref().map(|_| "<callback>"))
            .field("on_error", &self.on_error.as_ref().map(|_| "<callback>"))
            .finish()
    }
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod tests;
