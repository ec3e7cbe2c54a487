//! Tests for the transport facade: auth header, pipeline order, and error
//! normalization.

use super::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(5), Duration::from_millis(50))
}

async fn client_for(server: &MockServer) -> GraphClient {
    GraphClient::new(
        ClientConfig::default()
            .with_base_url(server.uri())
            .with_access_token("test-token")
            .with_retry(fast_retry()),
    )
    .expect("client should build")
}

// ============================================================================
// Test: Configuration Validation
// ============================================================================

#[test]
fn test_empty_api_version_is_rejected() {
    let config = ClientConfig::default().with_api_version("");

    assert!(matches!(
        config.validate(),
        Err(ValidationError::Required { .. })
    ));
}

#[test]
fn test_version_without_prefix_is_rejected() {
    let config = ClientConfig::default().with_api_version("18.0");

    assert!(matches!(
        config.validate(),
        Err(ValidationError::InvalidFormat { .. })
    ));
}

#[test]
fn test_base_url_derives_from_version() {
    let config = ClientConfig::default().with_api_version("v19.0");

    assert_eq!(
        config.resolved_base_url(),
        "https://graph.facebook.com/v19.0"
    );
}

#[test]
fn test_builder_produces_equivalent_config() {
    let config = ClientConfig::builder()
        .api_version("v19.0")
        .access_token("tok")
        .timeout(Duration::from_secs(5))
        .build();

    assert_eq!(config.api_version, "v19.0");
    assert_eq!(config.access_token.as_deref(), Some("tok"));
    assert_eq!(config.timeout, Duration::from_secs(5));
}

#[test]
fn test_debug_output_redacts_access_token() {
    let config = ClientConfig::default().with_access_token("super-secret");

    let output = format!("{config:?}");
    assert!(!output.contains("super-secret"));
    assert!(output.contains("redacted"));
}

// ============================================================================
// Test: Request Pipeline
// ============================================================================

#[tokio::test]
async fn test_get_attaches_bearer_token_and_parses_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("Authorization", "Bearer test-token"))
        .and(query_param("fields", "id,name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "42",
            "name": "Page Name"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let body: serde_json::Value = client
        .get("/me", &[("fields", "id,name")])
        .await
        .expect("request should succeed");

    assert_eq!(body["id"], "42");
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/123/feed"))
        .and(body_json(json!({"message": "hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "123_456"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let body: serde_json::Value = client
        .post("/123/feed", &json!({"message": "hello"}), &[])
        .await
        .expect("request should succeed");

    assert_eq!(body["id"], "123_456");
}

#[tokio::test]
async fn test_delete_parses_success_acknowledgement() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/123_456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let body: SuccessResponse = client
        .delete("/123_456", &[])
        .await
        .expect("request should succeed");

    assert!(body.success);
}

#[tokio::test]
async fn test_post_form_encodes_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/access_token"))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let body: serde_json::Value = client
        .post_form(
            "/oauth/access_token",
            &[("grant_type", "fb_exchange_token")],
        )
        .await
        .expect("request should succeed");

    assert_eq!(body["access_token"], "tok");
}

// ============================================================================
// Test: Error Normalization
// ============================================================================

#[tokio::test]
async fn test_structured_error_is_normalized_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "message": "Error validating access token",
                "type": "OAuthException",
                "code": 190,
                "fbtrace_id": "trace-1"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let error = client
        .get::<serde_json::Value>("/me", &[])
        .await
        .expect_err("401 should fail");

    assert!(error.recoverable(), "expired token is recoverable");
    assert_eq!(error.code(), Some(190));
    assert_eq!(error.to_string(), "Access token expired");
    assert_eq!(error.trace_id(), Some("trace-1"));
}

#[tokio::test]
async fn test_server_errors_are_retried_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"message": "Unknown error", "type": "GraphMethodException", "code": 1}
        })))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let body: serde_json::Value = client
        .get("/flaky", &[])
        .await
        .expect("retries should recover");

    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_rate_limited_responses_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/throttled"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/throttled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let body: serde_json::Value = client
        .get("/throttled", &[])
        .await
        .expect("429 then 200 should succeed");

    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_retry_exhaustion_surfaces_last_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(4)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let error = client
        .get::<serde_json::Value>("/down", &[])
        .await
        .expect_err("retries exhausted");

    assert!(matches!(error, GraphError::Http { status: 503, .. }));
}

#[tokio::test]
async fn test_connection_failure_becomes_network_error() {
    // Nothing listens on this port; connect fails without a response.
    let client = GraphClient::new(
        ClientConfig::default()
            .with_base_url("http://127.0.0.1:9")
            .with_retry(RetryPolicy::new(
                0,
                Duration::from_millis(1),
                Duration::from_millis(1),
            )),
    )
    .expect("client should build");

    let error = client
        .get::<serde_json::Value>("/me", &[])
        .await
        .expect_err("connect should fail");

    assert!(matches!(error, GraphError::Network { .. }));
    assert!(error.recoverable());
    assert!(error.is_transient());
}
