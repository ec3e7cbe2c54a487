//! # Meta Graph SDK — messaging
//!
//! WhatsApp Business Cloud API wrapper over the core transport:
//!
//! - [`MessagingClient`] — text, media, template, and interactive senders
//!   plus read receipts and media URL lookup. Interactive payloads are
//!   validated before any network call (at most 3 buttons, at most 10 list
//!   sections).
//! - [`WebhookVerifier`] — the subscription handshake and the raw-body
//!   HMAC signature check for deliveries.
//! - [`WebhookHandler`] — fans incoming messages and status updates out to
//!   registered async callbacks.
//!
//! Message payloads pass through as JSON; only the envelope fields the SDK
//! needs are typed.

// Public modules
pub mod client;
pub mod types;
pub mod webhook;

// Re-export commonly used types at crate root for convenience
pub use client::{MessagingClient, MessagingConfig};
pub use types::{
    InteractiveButton, ListRow, ListSection, MediaInfo, MessageContact, SendMessageResponse,
    SentMessage, WebhookMetadata,
};
pub use webhook::{WebhookHandler, WebhookVerifier};
