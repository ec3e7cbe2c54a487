//! # Meta Graph SDK — core transport
//!
//! Shared HTTP transport for the Graph API client suite. Every higher-level
//! crate (messaging, media, pages, auth) issues its requests through the
//! [`GraphClient`] defined here, which layers:
//!
//! - bearer authentication attached once at construction
//! - rolling-window rate limiting with FIFO queueing of over-budget callers
//! - bounded exponential-backoff retry for transient failures
//! - normalization of every failure into a [`GraphError`] carrying a
//!   human-readable message, a remedial action, and a recoverability flag
//!
//! The crate also provides the cursor-based [`pagination`] engine used to
//! drain long result sets, the pluggable [`storage::TokenStorage`] seam, and
//! the webhook crypto utilities (HMAC signature validation and the
//! subscription handshake).
//!
//! # Examples
//!
//! ```rust,no_run
//! use meta_graph_core::{ClientConfig, GraphClient};
//!
//! # async fn example() -> Result<(), meta_graph_core::GraphError> {
//! let client = GraphClient::new(
//!     ClientConfig::default().with_access_token("EAAB..."),
//! )?;
//!
//! let me: serde_json::Value = client.get("/me", &[("fields", "id,name")]).await?;
//! println!("{}", me);
//! # Ok(())
//! # }
//! ```

// Public modules
pub mod client;
pub mod error;
pub mod pagination;
pub mod rate_limit;
pub mod retry;
pub mod storage;
pub mod webhook;

// Re-export commonly used types at crate root for convenience
pub use client::{ClientConfig, ClientConfigBuilder, GraphClient, SuccessResponse, DEFAULT_API_VERSION};
pub use error::{GraphError, StorageError, UpstreamErrorBody, ValidationError};
pub use pagination::{drain, paginate, Cursors, Paged, Paging};
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use retry::{RetryHandler, RetryPolicy};
pub use storage::{MemoryTokenStorage, TokenStorage};
