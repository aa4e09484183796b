//! Shared per-game timelines and the feed that drives them.

pub mod feed;
pub mod manager;

pub use feed::{FeedSummary, spawn_feed};
pub use manager::{LiveError, SharedTimeline, TimelineManager};
