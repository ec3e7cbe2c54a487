//! # Meta Graph SDK — pages
//!
//! Facebook Page management over the core transport: publishing and listing
//! posts, moderating comments, and reading page/post insights. Long result
//! sets are drained through the core pagination engine, so listings walk
//! the cursor chain lazily and stop at the caller's limit.

// Public modules
pub mod client;
pub mod comments;
pub mod insights;
pub mod posts;

// Re-export commonly used types at crate root for convenience
pub use client::{PagesClient, PagesConfig};
pub use comments::{Comment, CreatedComment};
pub use insights::{Insight, InsightValue, PagePeriod};
pub use posts::{CreatedPost, PagePost};
