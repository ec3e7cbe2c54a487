//! # Meta Graph SDK — media publishing
//!
//! Instagram content publishing over the core transport. Publishing is a
//! two-step protocol: create a media container, then publish it once the
//! platform finishes processing. Carousels add a fan-out step — one child
//! container per item (2 to 10 of them), polled to completion before the
//! carousel container is created.

// Public modules
pub mod client;
pub mod insights;
pub mod media;

// Re-export commonly used types at crate root for convenience
pub use client::{MediaClient, MediaConfig};
pub use insights::InsightPeriod;
pub use media::{CarouselItem, MediaContainer, MediaPublishResponse};
