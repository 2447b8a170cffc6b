//! pulse - Scheduled market-topic content pipeline
//!
//! Periodically asks a generative model for trending topics, turns them
//! into a batch of short posts with image prompts, queues the batch in a
//! durable JSON file, and publishes one post per drain tick while
//! mirroring status to a chat channel.
//!
//! # Architecture
//!
//! ```text
//! refill:    price → Scout → Architect → image prompts → WorkQueue.append
//! drain:     WorkQueue.pop → Publisher → platform
//! heartbeat: price + queue length → log (+ notification)
//!
//! all three ──PulseEvent──▶ notifier task ──▶ chat
//! ```
//!
//! # Modules
//!
//! - `adapters`: External endpoints (Gemini, Coinbase, Telegram, X)
//! - `core`: Queue, pipeline, publisher, context, scheduler
//! - `domain`: Data structures (Topic, WorkItem, PulseEvent)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Run the bot until killed
//! pulse run
//!
//! # One refill cycle / one post, right now
//! pulse cycle
//! pulse publish
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;

// Re-export main types at crate root for convenience
pub use core::{PulseContext, Scheduler, WorkQueue};
pub use domain::{PulseEvent, Topic, WorkItem};
