//! Tests for messaging senders and their pre-flight validation.

use super::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn accepted() -> serde_json::Value {
    json!({
        "messaging_product": "whatsapp",
        "contacts": [{"input": "15557654321", "wa_id": "15557654321"}],
        "messages": [{"id": "wamid.HBgL"}]
    })
}

async fn client_for(server: &MockServer) -> MessagingClient {
    MessagingClient::new(
        MessagingConfig::new("wa-token", "15551234567").with_base_url(server.uri()),
    )
    .expect("messaging client should build")
}

fn buttons(count: usize) -> Vec<InteractiveButton> {
    (0..count)
        .map(|index| InteractiveButton {
            id: format!("btn-{index}"),
            title: format!("Button {index}"),
        })
        .collect()
}

fn sections(count: usize) -> Vec<ListSection> {
    (0..count)
        .map(|index| ListSection {
            title: format!("Section {index}"),
            rows: vec![crate::types::ListRow {
                id: format!("row-{index}"),
                title: "Row".to_string(),
                description: None,
            }],
        })
        .collect()
}

// ============================================================================
// Test: Configuration Validation
// ============================================================================

#[test]
fn test_missing_access_token_is_rejected() {
    let config = MessagingConfig::new("", "15551234567");

    assert!(config.validate().is_err());
}

#[test]
fn test_missing_phone_number_id_is_rejected() {
    let config = MessagingConfig::new("wa-token", "");

    assert!(config.validate().is_err());
}

#[test]
fn test_debug_output_redacts_token() {
    let config = MessagingConfig::new("wa-secret-token", "15551234567");

    assert!(!format!("{config:?}").contains("wa-secret-token"));
}

// ============================================================================
// Test: Senders
// ============================================================================

#[tokio::test]
async fn test_send_text_posts_to_messages_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/15551234567/messages"))
        .and(header("Authorization", "Bearer wa-token"))
        .and(body_partial_json(json!({
            "messaging_product": "whatsapp",
            "to": "15557654321",
            "type": "text",
            "text": {"body": "hello", "preview_url": false}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(accepted()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let response = client
        .send_text("15557654321", "hello", false)
        .await
        .expect("send should succeed");

    assert_eq!(response.message_id(), Some("wamid.HBgL"));
}

#[tokio::test]
async fn test_send_image_carries_link_and_caption() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/15551234567/messages"))
        .and(body_partial_json(json!({
            "type": "image",
            "image": {"link": "https://example.com/cat.jpg", "caption": "a cat"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(accepted()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client
        .send_image("15557654321", "https://example.com/cat.jpg", Some("a cat"))
        .await
        .expect("send should succeed");
}

#[tokio::test]
async fn test_send_template_includes_language_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/15551234567/messages"))
        .and(body_partial_json(json!({
            "type": "template",
            "template": {"name": "order_update", "language": {"code": "en_US"}}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(accepted()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client
        .send_template("15557654321", "order_update", "en_US", None)
        .await
        .expect("send should succeed");
}

#[tokio::test]
async fn test_mark_as_read_posts_status_update() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/15551234567/messages"))
        .and(body_partial_json(json!({
            "status": "read",
            "message_id": "wamid.HBgL"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let response = client
        .mark_as_read("wamid.HBgL")
        .await
        .expect("mark as read should succeed");

    assert!(response.success);
}

#[tokio::test]
async fn test_media_info_resolves_download_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/media-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "https://lookaside.example.com/media-123",
            "mime_type": "image/jpeg",
            "file_size": 12345
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let info = client
        .media_info("media-123")
        .await
        .expect("lookup should succeed");

    assert_eq!(info.url, "https://lookaside.example.com/media-123");
    assert_eq!(info.mime_type.as_deref(), Some("image/jpeg"));
}

// ============================================================================
// Test: Interactive Message Validation
// ============================================================================

#[tokio::test]
async fn test_three_buttons_are_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/15551234567/messages"))
        .and(body_partial_json(json!({"type": "interactive"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(accepted()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client
        .send_interactive_buttons("15557654321", "pick one", &buttons(3))
        .await
        .expect("three buttons are within the limit");
}

#[tokio::test]
async fn test_four_buttons_fail_before_any_network_call() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    let error = client
        .send_interactive_buttons("15557654321", "pick one", &buttons(4))
        .await
        .expect_err("four buttons exceed the limit");

    assert!(matches!(
        error,
        GraphError::Validation(ValidationError::OutOfRange { .. })
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_button_list_is_rejected() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    let error = client
        .send_interactive_buttons("15557654321", "pick one", &[])
        .await
        .expect_err("zero buttons is invalid");

    assert!(matches!(error, GraphError::Validation(_)));
}

#[tokio::test]
async fn test_ten_sections_are_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/15551234567/messages"))
        .and(body_partial_json(json!({"type": "interactive"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(accepted()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    client
        .send_interactive_list("15557654321", "menu", "Open", &sections(10))
        .await
        .expect("ten sections are within the limit");
}

#[tokio::test]
async fn test_eleven_sections_fail_before_any_network_call() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    let error = client
        .send_interactive_list("15557654321", "menu", "Open", &sections(11))
        .await
        .expect_err("eleven sections exceed the limit");

    assert!(matches!(
        error,
        GraphError::Validation(ValidationError::OutOfRange { .. })
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}
