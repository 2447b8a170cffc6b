//! Core pipeline logic.
//!
//! This module contains:
//! - Queue: Durable FIFO of work items behind a single-owner task
//! - Extract: Tolerant JSON-array extraction from model output
//! - Pipeline: Scout, Architect, image prompts
//! - Publisher: Posting one item
//! - Notify: Event sink and notification subscriber
//! - Context: Shared state and the refill/drain/heartbeat operations
//! - Scheduler: The periodic triggers

pub mod context;
pub mod extract;
pub mod notify;
pub mod pipeline;
pub mod prompts;
pub mod publisher;
pub mod queue;
pub mod scheduler;

// Re-export commonly used types
pub use context::{DrainOutcome, HeartbeatReport, PulseContext, RefillOutcome};
pub use extract::{extract_array, find_array_span, ExtractError};
pub use notify::{render, spawn_notifier, EventSink};
pub use pipeline::ContentPipeline;
pub use publisher::{Published, Publisher};
pub use queue::{QueueError, QueueHandle, WorkQueue};
pub use scheduler::{Scheduler, Trigger};
