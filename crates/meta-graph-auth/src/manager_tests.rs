//! Tests for the token lifecycle manager: validate-on-store, lazy
//! re-validation, scheduled refresh, and revocation.

use super::*;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::AuthConfig;

fn debug_body(is_valid: bool, expires_at: i64) -> serde_json::Value {
    json!({
        "data": {
            "app_id": "app-1",
            "is_valid": is_valid,
            "expires_at": expires_at,
            "scopes": ["pages_show_list"],
            "user_id": "platform-user-7"
        }
    })
}

fn in_days(days: i64) -> i64 {
    (Utc::now() + Duration::days(days)).timestamp()
}

async fn mount_debug(server: &MockServer, token: &str, is_valid: bool, expires_at: i64) {
    Mock::given(method("GET"))
        .and(path("/debug_token"))
        .and(query_param("input_token", token))
        .respond_with(ResponseTemplate::new(200).set_body_json(debug_body(is_valid, expires_at)))
        .mount(server)
        .await;
}

async fn manager_for(server: &MockServer) -> TokenManager {
    let auth = AuthClient::new(AuthConfig::new("app-1", "secret-1").with_base_url(server.uri()))
        .expect("auth client should build");
    TokenManager::new(auth, TokenManagerConfig::default())
}

// ============================================================================
// Test: Store and Read
// ============================================================================

#[tokio::test]
async fn test_store_then_get_returns_token() {
    let server = MockServer::start().await;
    mount_debug(&server, "healthy-token", true, in_days(30)).await;

    let manager = manager_for(&server).await;
    manager
        .store_token("alice", "healthy-token")
        .await
        .expect("store should succeed");

    let token = manager.get_token("alice").await.expect("get should succeed");
    assert_eq!(token.as_deref(), Some("healthy-token"));

    manager.destroy();
}

#[tokio::test]
async fn test_storing_invalid_token_fails_and_persists_nothing() {
    let server = MockServer::start().await;
    mount_debug(&server, "dead-token", false, 0).await;

    let manager = manager_for(&server).await;
    let error = manager
        .store_token("alice", "dead-token")
        .await
        .expect_err("invalid token must not store");

    assert!(matches!(error, GraphError::Validation(_)));
    assert!(!manager.refresh_scheduled("alice"));
    assert!(manager
        .token_metadata("alice")
        .await
        .expect("metadata read")
        .is_none());
}

#[tokio::test]
async fn test_get_for_unknown_user_is_none() {
    let server = MockServer::start().await;
    let manager = manager_for(&server).await;

    assert!(manager.get_token("nobody").await.expect("get").is_none());
}

#[tokio::test]
async fn test_metadata_is_persisted_alongside_token() {
    let server = MockServer::start().await;
    mount_debug(&server, "healthy-token", true, in_days(30)).await;

    let manager = manager_for(&server).await;
    manager
        .store_token("alice", "healthy-token")
        .await
        .expect("store should succeed");

    let metadata = manager
        .token_metadata("alice")
        .await
        .expect("metadata read")
        .expect("metadata present");

    assert_eq!(metadata.scopes, vec!["pages_show_list".to_string()]);
    assert_eq!(metadata.user_id.as_deref(), Some("platform-user-7"));
    assert!(metadata.expires_at.is_some());

    manager.destroy();
}

#[tokio::test]
async fn test_invalid_token_is_evicted_on_read() {
    let server = MockServer::start().await;
    // Valid at store time, invalid on the next introspection.
    Mock::given(method("GET"))
        .and(path("/debug_token"))
        .and(query_param("input_token", "revoked-later"))
        .respond_with(ResponseTemplate::new(200).set_body_json(debug_body(true, in_days(30))))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/debug_token"))
        .and(query_param("input_token", "revoked-later"))
        .respond_with(ResponseTemplate::new(200).set_body_json(debug_body(false, 0)))
        .mount(&server)
        .await;

    let manager = manager_for(&server).await;
    manager
        .store_token("alice", "revoked-later")
        .await
        .expect("store should succeed");

    assert!(manager.get_token("alice").await.expect("get").is_none());
    assert!(
        manager
            .token_metadata("alice")
            .await
            .expect("metadata read")
            .is_none(),
        "eviction removes metadata too"
    );
    assert!(!manager.refresh_scheduled("alice"), "eviction cancels the timer");
}

// ============================================================================
// Test: Scheduled Refresh
// ============================================================================

#[tokio::test]
async fn test_store_schedules_exactly_one_refresh() {
    let server = MockServer::start().await;
    mount_debug(&server, "ten-day-token", true, in_days(10)).await;
    // No exchange may happen while the timer is pending.
    Mock::given(method("GET"))
        .and(path("/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "x"})))
        .expect(0)
        .mount(&server)
        .await;

    let manager = manager_for(&server).await;
    manager
        .store_token("alice", "ten-day-token")
        .await
        .expect("store should succeed");

    assert!(manager.refresh_scheduled("alice"));

    // Storing again replaces, not duplicates, the timer.
    manager
        .store_token("alice", "ten-day-token")
        .await
        .expect("store should succeed");
    assert!(manager.refresh_scheduled("alice"));

    manager.destroy();
}

#[tokio::test]
async fn test_remove_token_cancels_pending_refresh() {
    let server = MockServer::start().await;
    mount_debug(&server, "ten-day-token", true, in_days(10)).await;
    Mock::given(method("GET"))
        .and(path("/oauth/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "x"})))
        .expect(0)
        .mount(&server)
        .await;

    let manager = manager_for(&server).await;
    manager
        .store_token("alice", "ten-day-token")
        .await
        .expect("store should succeed");
    manager
        .remove_token("alice")
        .await
        .expect("remove should succeed");

    assert!(!manager.refresh_scheduled("alice"));
    assert!(manager.get_token("alice").await.expect("get").is_none());

    // Give a mis-cancelled timer a chance to fire; the expect(0) above
    // verifies no refresh side effect is observed.
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
}

#[tokio::test]
async fn test_refresh_timer_fires_and_replaces_token() {
    let server = MockServer::start().await;
    // Expires two seconds past the refresh threshold, so the timer fires
    // almost immediately.
    let expires_at = (Utc::now() + Duration::days(7) + Duration::seconds(2)).timestamp();
    mount_debug(&server, "aging-token", true, expires_at).await;
    mount_debug(&server, "extended-token", true, in_days(60)).await;
    Mock::given(method("GET"))
        .and(path("/oauth/access_token"))
        .and(query_param("grant_type", "fb_exchange_token"))
        .and(query_param("fb_exchange_token", "aging-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "extended-token",
            "expires_in": 5_183_944
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager_for(&server).await;
    manager
        .store_token("alice", "aging-token")
        .await
        .expect("store should succeed");
    assert!(manager.refresh_scheduled("alice"));

    tokio::time::sleep(std::time::Duration::from_secs(3)).await;

    let token = manager.get_token("alice").await.expect("get should succeed");
    assert_eq!(token.as_deref(), Some("extended-token"));

    manager.destroy();
}

#[tokio::test]
async fn test_auto_refresh_disabled_schedules_nothing() {
    let server = MockServer::start().await;
    mount_debug(&server, "ten-day-token", true, in_days(10)).await;

    let auth = AuthClient::new(AuthConfig::new("app-1", "secret-1").with_base_url(server.uri()))
        .expect("auth client should build");
    let manager = TokenManager::new(
        auth,
        TokenManagerConfig {
            auto_refresh: false,
            ..TokenManagerConfig::default()
        },
    );

    manager
        .store_token("alice", "ten-day-token")
        .await
        .expect("store should succeed");

    assert!(!manager.refresh_scheduled("alice"));
}

// ============================================================================
// Test: Manual Refresh
// ============================================================================

#[tokio::test]
async fn test_manual_refresh_without_stored_token_is_a_hard_error() {
    let server = MockServer::start().await;
    let manager = manager_for(&server).await;

    let error = manager
        .refresh_token("nobody")
        .await
        .expect_err("no stored token");

    assert!(matches!(error, GraphError::TokenNotFound { .. }));
}

#[tokio::test]
async fn test_lazy_refresh_falls_back_to_prior_token_on_failure() {
    let server = MockServer::start().await;
    // Token inside the refresh threshold; the exchange endpoint rejects.
    mount_debug(&server, "aging-token", true, in_days(3)).await;
    Mock::given(method("GET"))
        .and(path("/oauth/access_token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Invalid parameter", "type": "OAuthException", "code": 100}
        })))
        .mount(&server)
        .await;

    let manager = manager_for(&server).await;
    manager
        .store_token("alice", "aging-token")
        .await
        .expect("store should succeed");

    let token = manager.get_token("alice").await.expect("get should succeed");

    assert_eq!(
        token.as_deref(),
        Some("aging-token"),
        "refresh failure returns the prior known-good token"
    );
}

// ============================================================================
// Test: Revocation
// ============================================================================

#[tokio::test]
async fn test_revoke_calls_upstream_then_evicts() {
    let server = MockServer::start().await;
    mount_debug(&server, "healthy-token", true, in_days(30)).await;
    Mock::given(method("DELETE"))
        .and(path("/me/permissions"))
        .and(query_param("access_token", "healthy-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager_for(&server).await;
    manager
        .store_token("alice", "healthy-token")
        .await
        .expect("store should succeed");
    manager
        .revoke_token("alice")
        .await
        .expect("revoke should succeed");

    assert!(manager.get_token("alice").await.expect("get").is_none());
    assert!(!manager.refresh_scheduled("alice"));
}

#[tokio::test]
async fn test_revoke_failure_is_logged_not_propagated() {
    let server = MockServer::start().await;
    mount_debug(&server, "healthy-token", true, in_days(30)).await;
    Mock::given(method("DELETE"))
        .and(path("/me/permissions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Invalid parameter", "type": "OAuthException", "code": 100}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = manager_for(&server).await;
    manager
        .store_token("alice", "healthy-token")
        .await
        .expect("store should succeed");

    manager
        .revoke_token("alice")
        .await
        .expect("revoke is best-effort");

    assert!(
        manager.get_token("alice").await.expect("get").is_none(),
        "local eviction happens even when upstream revocation fails"
    );
}

// ============================================================================
// Test: Isolation and Shutdown
// ============================================================================

#[tokio::test]
async fn test_users_do_not_interfere() {
    let server = MockServer::start().await;
    mount_debug(&server, "token-a", true, in_days(30)).await;
    mount_debug(&server, "token-b", true, in_days(30)).await;

    let manager = manager_for(&server).await;
    manager.store_token("alice", "token-a").await.expect("store");
    manager.store_token("bob", "token-b").await.expect("store");

    manager.remove_token("alice").await.expect("remove");

    assert!(manager.get_token("alice").await.expect("get").is_none());
    assert_eq!(
        manager.get_token("bob").await.expect("get").as_deref(),
        Some("token-b")
    );

    manager.destroy();
}

#[tokio::test]
async fn test_destroy_cancels_every_timer() {
    let server = MockServer::start().await;
    mount_debug(&server, "token-a", true, in_days(30)).await;
    mount_debug(&server, "token-b", true, in_days(30)).await;

    let manager = manager_for(&server).await;
    manager.store_token("alice", "token-a").await.expect("store");
    manager.store_token("bob", "token-b").await.expect("store");
    assert!(manager.refresh_scheduled("alice"));
    assert!(manager.refresh_scheduled("bob"));

    manager.destroy();

    assert!(!manager.refresh_scheduled("alice"));
    assert!(!manager.refresh_scheduled("bob"));
}
