//! # Meta Graph SDK — OAuth token lifecycle
//!
//! Server-side OAuth for the Graph API:
//!
//! - [`AuthClient`] — code-for-token exchange, short-to-long-lived exchange,
//!   token debugging/validation, revocation, and authorization-URL building
//!   with CSRF state, all issued through the core transport.
//! - [`TokenManager`] — per-user token records with validate-on-store,
//!   lazy re-validation on read, and proactive one-shot refresh timers that
//!   fire a configurable number of days before expiry.
//!
//! # Examples
//!
//! ```rust,no_run
//! use meta_graph_auth::{AuthClient, AuthConfig, TokenManager, TokenManagerConfig};
//!
//! # async fn example() -> Result<(), meta_graph_core::GraphError> {
//! let auth = AuthClient::new(AuthConfig::new("app-id", "app-secret"))?;
//! let manager = TokenManager::new(auth, TokenManagerConfig::default());
//!
//! manager.store_token("user-1", "EAAB...").await?;
//! let token = manager.get_token("user-1").await?;
//! # Ok(())
//! # }
//! ```

// Public modules
pub mod client;
pub mod manager;
pub mod types;

// Re-export commonly used types at crate root for convenience
pub use client::{AuthClient, AuthConfig};
pub use manager::{TokenManager, TokenManagerConfig};
pub use types::{
    DebugTokenData, DebugTokenResponse, PageAccessToken, StoredTokenMetadata,
    TokenExchangeResponse, TokenValidation,
};
