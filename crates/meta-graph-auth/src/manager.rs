//! Per-user token lifecycle management.
//!
//! A [`TokenManager`] tracks one token record per application-defined user
//! id: tokens are validated before storage, re-validated lazily on read,
//! refreshed proactively by a one-shot timer a configurable number of days
//! before expiry, and evicted on removal or revocation. Refreshes for a
//! given user — manual or scheduled — are serialized by a per-user lock, so
//! two refreshes never race; operations on different users never block each
//! other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use meta_graph_core::{GraphError, MemoryTokenStorage, TokenStorage, ValidationError};

use crate::client::AuthClient;
use crate::types::StoredTokenMetadata;

/// Configuration for token lifecycle behavior.
#[derive(Debug, Clone)]
pub struct TokenManagerConfig {
    /// Schedule a proactive refresh when storing a token with a known expiry
    pub auto_refresh: bool,

    /// Refresh this many days before expiry (also the laziness threshold on
    /// read)
    pub refresh_threshold_days: i64,
}

impl Default for TokenManagerConfig {
    fn default() -> Self {
        Self {
            auto_refresh: true,
            refresh_threshold_days: 7,
        }
    }
}

/// Manages stored tokens with validation, scheduled refresh, and revocation.
///
/// Cloning shares the underlying records and timers.
///
/// Call [`destroy`] on shutdown: outstanding refresh timers hold the manager
/// alive and would otherwise fire against a torn-down process.
///
/// [`destroy`]: TokenManager::destroy
#[derive(Clone)]
pub struct TokenManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    auth: AuthClient,
    storage: Arc<dyn TokenStorage>,
    auto_refresh: bool,
    refresh_threshold: Duration,
    timers: StdMutex<HashMap<String, JoinHandle<()>>>,
    user_locks: StdMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl TokenManager {
    /// Create a manager backed by in-memory storage.
    pub fn new(auth: AuthClient, config: TokenManagerConfig) -> Self {
        Self::with_storage(auth, config, Arc::new(MemoryTokenStorage::new()))
    }

    /// Create a manager backed by a caller-supplied storage implementation.
    pub fn with_storage(
        auth: AuthClient,
        config: TokenManagerConfig,
        storage: Arc<dyn TokenStorage>,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                auth,
                storage,
                auto_refresh: config.auto_refresh,
                refresh_threshold: Duration::days(config.refresh_threshold_days),
                timers: StdMutex::new(HashMap::new()),
                user_locks: StdMutex::new(HashMap::new()),
            }),
        }
    }

    /// Validate a token and persist it for `user_id`.
    ///
    /// The record's TTL matches the token expiry, and — when auto-refresh is
    /// enabled and an expiry is known — a one-shot refresh timer is
    /// scheduled, replacing any previous timer for the user.
    ///
    /// # Errors
    ///
    /// Storing a token the platform reports as invalid fails with
    /// [`GraphError::Validation`]; nothing is persisted.
    pub async fn store_token(&self, user_id: &str, token: &str) -> Result<(), GraphError> {
        ManagerInner::store(&self.inner, user_id, token).await
    }

    /// Fetch the stored token for `user_id`, re-validating lazily.
    ///
    /// An invalid or expired record is evicted and `None` returned. A token
    /// inside the refresh threshold is refreshed in place; when the refresh
    /// fails the prior token is returned and the failure only logged.
    pub async fn get_token(&self, user_id: &str) -> Result<Option<String>, GraphError> {
        let Some(token) = self.inner.storage.get(&token_key(user_id)).await? else {
            return Ok(None);
        };

        let validation = self.inner.auth.validate_token(&token).await;
        if !validation.valid {
            self.remove_token(user_id).await?;
            return Ok(None);
        }

        if self.inner.due_for_refresh(validation.expires_at) {
            let lock = self.inner.user_lock(user_id);
            let _guard = lock.lock().await;
            match ManagerInner::refresh_stored(&self.inner, user_id).await {
                Ok(refreshed) => return Ok(Some(refreshed)),
                Err(error) => {
                    warn!(user_id, error = %error, "token refresh failed, returning prior token");
                    return Ok(Some(token));
                }
            }
        }

        Ok(Some(token))
    }

    /// Force-refresh the stored token for `user_id`.
    ///
    /// # Errors
    ///
    /// Fails with [`GraphError::TokenNotFound`] when no token is stored —
    /// unlike the lazy path there is no prior value to fall back to.
    pub async fn refresh_token(&self, user_id: &str) -> Result<String, GraphError> {
        let lock = self.inner.user_lock(user_id);
        let _guard = lock.lock().await;
        ManagerInner::refresh_stored(&self.inner, user_id).await
    }

    /// Remove the stored token and metadata, cancelling any pending refresh.
    pub async fn remove_token(&self, user_id: &str) -> Result<(), GraphError> {
        self.inner.cancel_refresh(user_id);
        self.inner.storage.delete(&token_key(user_id)).await?;
        self.inner.storage.delete(&meta_key(user_id)).await?;
        Ok(())
    }

    /// Revoke the stored token upstream, then evict it locally.
    ///
    /// The upstream call is best-effort: a revocation failure is logged and
    /// local eviction happens regardless.
    pub async fn revoke_token(&self, user_id: &str) -> Result<(), GraphError> {
        if let Some(token) = self.inner.storage.get(&token_key(user_id)).await? {
            if let Err(error) = self.inner.auth.revoke_token(&token).await {
                warn!(
                    user_id,
                    error = %error,
                    "upstream token revocation failed, evicting locally anyway"
                );
            }
        }
        self.remove_token(user_id).await
    }

    /// Check if a valid token is stored for `user_id`.
    pub async fn has_valid_token(&self, user_id: &str) -> Result<bool, GraphError> {
        Ok(self.get_token(user_id).await?.is_some())
    }

    /// Fetch the metadata persisted alongside the token.
    pub async fn token_metadata(
        &self,
        user_id: &str,
    ) -> Result<Option<StoredTokenMetadata>, GraphError> {
        let Some(raw) = self.inner.storage.get(&meta_key(user_id)).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Whether a refresh timer is currently scheduled for `user_id`.
    pub fn refresh_scheduled(&self, user_id: &str) -> bool {
        self.inner.lock_timers().contains_key(user_id)
    }

    /// Cancel every outstanding refresh timer.
    ///
    /// Required for clean shutdown; a timer that has already started
    /// executing runs to completion.
    pub fn destroy(&self) {
        let mut timers = self.inner.lock_timers();
        for (_, handle) in timers.drain() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("auto_refresh", &self.inner.auto_refresh)
            .field("refresh_threshold_days", &self.inner.refresh_threshold.num_days())
            .field("scheduled_timers", &self.inner.lock_timers().len())
            .finish()
    }
}

impl ManagerInner {
    async fn store(inner: &Arc<Self>, user_id: &str, token: &str) -> Result<(), GraphError> {
        let validation = inner.auth.validate_token(token).await;
        if !validation.valid {
            return Err(ValidationError::InvalidFormat {
                field: "access_token".to_string(),
                message: format!(
                    "cannot store invalid token: {}",
                    validation.error.as_deref().unwrap_or("unknown reason")
                ),
            }
            .into());
        }

        let ttl = validation
            .expires_at
            .and_then(|expires_at| (expires_at - Utc::now()).to_std().ok());
        let metadata = StoredTokenMetadata {
            expires_at: validation.expires_at,
            scopes: validation.scopes,
            user_id: validation.user_id,
        };

        inner.storage.set(&token_key(user_id), token, ttl).await?;
        inner
            .storage
            .set(&meta_key(user_id), &serde_json::to_string(&metadata)?, ttl)
            .await?;

        if inner.auto_refresh {
            if let Some(expires_at) = metadata.expires_at {
                Self::schedule_refresh(inner, user_id, expires_at);
            }
        }

        Ok(())
    }

    async fn refresh_stored(inner: &Arc<Self>, user_id: &str) -> Result<String, GraphError> {
        let Some(token) = inner.storage.get(&token_key(user_id)).await? else {
            return Err(GraphError::TokenNotFound {
                user_id: user_id.to_string(),
            });
        };

        let refreshed = inner.auth.refresh_token(&token).await?;
        Self::store(inner, user_id, &refreshed.access_token).await?;
        Ok(refreshed.access_token)
    }

    fn schedule_refresh(inner: &Arc<Self>, user_id: &str, expires_at: DateTime<Utc>) {
        inner.cancel_refresh(user_id);

        let refresh_at = expires_at - inner.refresh_threshold;
        let Ok(delay) = (refresh_at - Utc::now()).to_std() else {
            // Already inside the refresh window; the lazy path on the next
            // read covers it.
            return;
        };

        let task_inner = Arc::clone(inner);
        let user = user_id.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            // Drop our own map entry before re-entering store so the
            // replacement schedule never aborts this task mid-flight.
            task_inner.lock_timers().remove(&user);

            let lock = task_inner.user_lock(&user);
            let _guard = lock.lock().await;
            match Self::refresh_stored(&task_inner, &user).await {
                Ok(_) => debug!(user_id = %user, "auto-refreshed stored token"),
                Err(error) => {
                    warn!(user_id = %user, error = %error, "scheduled token refresh failed")
                }
            }
        });

        inner.lock_timers().insert(user_id.to_string(), handle);
    }

    fn due_for_refresh(&self, expires_at: Option<DateTime<Utc>>) -> bool {
        expires_at.is_some_and(|expires_at| {
            (expires_at - Utc::now()).num_days() <= self.refresh_threshold.num_days()
        })
    }

    fn cancel_refresh(&self, user_id: &str) {
        if let Some(handle) = self.lock_timers().remove(user_id) {
            handle.abort();
        }
    }

    fn user_lock(&self, user_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .user_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(user_id.to_string()).or_default())
    }

    fn lock_timers(&self) -> MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        self.timers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn token_key(user_id: &str) -> String {
    format!("token:{user_id}")
}

fn meta_key(user_id: &str) -> String {
    format!("token_meta:{user_id}")
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
