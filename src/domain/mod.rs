//! Domain types for the pulse pipeline.
//!
//! This module contains the core data structures:
//! - Topic: What trend discovery surfaces
//! - WorkItem: What the queue holds and the publisher posts
//! - PulseEvent: Outcomes the notifier reports

pub mod events;
pub mod item;
pub mod topic;

// Re-export commonly used types
pub use events::{describe_period, PulseEvent};
pub use item::{normalize_text, preview, WorkItem};
pub use topic::{RecentThemes, Topic};
