//! Outcomes emitted by the pipeline and the triggers.
//!
//! Pipeline steps never talk to the notification channel directly. They
//! emit a `PulseEvent`; the notifier task subscribes and turns each one
//! into a message.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Something worth telling the operator about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PulseEvent {
    /// The process came up and the triggers are about to start
    Started {
        refill_every: String,
        drain_every: String,
        heartbeat_every: String,
    },

    /// Trend discovery produced topics
    TrendsFound {
        topics: Vec<String>,
        price: Option<f64>,
    },

    /// A batch of items was generated and queued
    BatchGenerated {
        count: usize,
        drain_every: String,
        price: Option<f64>,
    },

    /// An item went live on the platform
    Published {
        index: usize,
        preview: String,
        permalink: String,
        image_prompt: Option<String>,
    },

    /// Periodic liveness report
    Heartbeat {
        queue_len: usize,
        price: Option<f64>,
        at: DateTime<Local>,
    },
}

impl PulseEvent {
    /// Short name used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::TrendsFound { .. } => "trends_found",
            Self::BatchGenerated { .. } => "batch_generated",
            Self::Published { .. } => "published",
            Self::Heartbeat { .. } => "heartbeat",
        }
    }
}

/// Render a duration the way operators read cadences ("5h", "20m", "90s").
pub fn describe_period(period: std::time::Duration) -> String {
    let secs = period.as_secs();
    if secs >= 3600 && secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else if secs >= 60 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{}s", secs)
    }
}
