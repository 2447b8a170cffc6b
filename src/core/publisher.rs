//! Sends one work item to the platform.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, instrument};

use crate::adapters::Platform;
use crate::domain::{normalize_text, PulseEvent, WorkItem};

/// A post that went live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub post_id: String,
    pub permalink: String,
    /// The text as actually sent
    pub text: String,
}

impl Published {
    /// Notification event for this post
    pub fn event(&self, item: &WorkItem) -> PulseEvent {
        PulseEvent::Published {
            index: item.index,
            preview: self.text.clone(),
            permalink: self.permalink.clone(),
            image_prompt: item.image_prompt.clone(),
        }
    }
}

/// Platform publisher with text normalization
pub struct Publisher {
    platform: Arc<dyn Platform>,
    max_length: usize,
    timeout: Duration,
}

impl Publisher {
    pub fn new(platform: Arc<dyn Platform>, max_length: usize, timeout: Duration) -> Self {
        Self {
            platform,
            max_length,
            timeout,
        }
    }

    /// Publish `item`. Failures are logged and yield `None`; nothing is retried.
    #[instrument(skip_all, fields(index = item.index))]
    pub async fn publish(&self, item: &WorkItem) -> Option<Published> {
        let text = normalize_text(&item.text, self.max_length);
        if text.is_empty() {
            error!("Post failed: empty text");
            return None;
        }

        match self.platform.post(&text, self.timeout).await {
            Ok(post_id) => {
                info!(%post_id, "Posted");
                Some(Published {
                    permalink: self.platform.permalink(&post_id),
                    post_id,
                    text,
                })
            }
            Err(e) => {
                error!(error = %e, "Post failed");
                None
            }
        }
    }
}
