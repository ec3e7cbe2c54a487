//! Wire types for the messaging API.

use serde::{Deserialize, Serialize};

/// Acknowledgement returned when a message is accepted for delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageResponse {
    #[serde(default)]
    pub messaging_product: Option<String>,

    #[serde(default)]
    pub contacts: Vec<MessageContact>,

    #[serde(default)]
    pub messages: Vec<SentMessage>,
}

impl SendMessageResponse {
    /// Id of the first accepted message, the common case.
    pub fn message_id(&self) -> Option<&str> {
        self.messages.first().map(|message| message.id.as_str())
    }
}

/// Recipient echo in a send acknowledgement.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageContact {
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub wa_id: Option<String>,
}

/// An accepted message reference.
#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    pub id: String,
}

/// A reply button on an interactive message. At most 3 per message.
#[derive(Debug, Clone, Serialize)]
pub struct InteractiveButton {
    pub id: String,
    pub title: String,
}

/// A section of an interactive list message. At most 10 per message.
#[derive(Debug, Clone, Serialize)]
pub struct ListSection {
    pub title: String,
    pub rows: Vec<ListRow>,
}

/// A selectable row inside a list section.
#[derive(Debug, Clone, Serialize)]
pub struct ListRow {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Media metadata from a media-id lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaInfo {
    pub url: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub id: Option<String>,
}

/// Phone-number context attached to every webhook change.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookMetadata {
    pub display_phone_number: String,
    pub phone_number_id: String,
}
