//! Content generation: trend scouting, batch writing, image prompts.
//!
//! Every step here is best-effort. Failures are logged and turn into an
//! empty result; the caller treats empty as "nothing this cycle".

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::adapters::Generator;
use crate::config::{ContentSettings, TimeoutSettings};
use crate::domain::item::StoredItem;
use crate::domain::{normalize_text, Topic, WorkItem};

use super::extract::extract_array;
use super::prompts;

/// Scout → Architect → image prompts, over one generator
pub struct ContentPipeline {
    generator: Arc<dyn Generator>,
    content: ContentSettings,
    timeouts: TimeoutSettings,
}

impl ContentPipeline {
    pub fn new(
        generator: Arc<dyn Generator>,
        content: ContentSettings,
        timeouts: TimeoutSettings,
    ) -> Self {
        Self {
            generator,
            content,
            timeouts,
        }
    }

    pub fn content(&self) -> &ContentSettings {
        &self.content
    }

    /// Ask for current topics, avoiding `recent` themes.
    #[instrument(skip_all, fields(generator = %self.generator.name()))]
    pub async fn scout(&self, price: Option<f64>, recent: &[String]) -> Vec<Topic> {
        let prompt = prompts::scout(&self.content, price, recent);

        let response = match self.generator.generate(&prompt, self.timeouts.scout()).await {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Scout error");
                return Vec::new();
            }
        };

        let entries = match extract_array::<serde_json::Value>(&response) {
            Ok(entries) => entries,
            Err(e) => {
                error!(error = %e, "Scout error");
                return Vec::new();
            }
        };

        // Bad entries are skipped individually
        let topics: Vec<Topic> = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<Topic>(entry) {
                Ok(topic) if !topic.name.trim().is_empty() => Some(topic),
                Ok(_) => {
                    warn!("Skipping topic with blank name");
                    None
                }
                Err(e) => {
                    warn!(error = %e, "Skipping malformed topic");
                    None
                }
            })
            .collect();

        info!(count = topics.len(), "Scout found trending topics");
        topics
    }

    /// Turn `topics` into a batch of items, each with an optional image prompt.
    ///
    /// Image prompts are requested one at a time, in item order.
    #[instrument(skip_all, fields(topics = topics.len()))]
    pub async fn architect(&self, topics: &[Topic], price: Option<f64>) -> Vec<WorkItem> {
        let prompt = prompts::architect(&self.content, topics, price);

        let response = match self
            .generator
            .generate(&prompt, self.timeouts.architect())
            .await
        {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Architect error");
                return Vec::new();
            }
        };

        // Generated posts share the lenient stored shape
        let posts = match extract_array::<StoredItem>(&response) {
            Ok(posts) => posts,
            Err(e) => {
                error!(error = %e, "Architect error");
                return Vec::new();
            }
        };

        // Topics pair with posts by position in the reply
        let bodies: Vec<(usize, String)> = posts
            .into_iter()
            .enumerate()
            .map(|(pos, post)| (pos, normalize_text(post.body(), self.content.max_post_length)))
            .filter(|(_, body)| !body.is_empty())
            .collect();

        info!(count = bodies.len(), "Generating image prompts");

        let mut items = Vec::with_capacity(bodies.len());
        for (pos, body) in bodies {
            let topic = topics
                .get(pos)
                .map(|t| t.name.as_str())
                .unwrap_or(self.content.subject.as_str());
            let image_prompt = self.image_prompt(&body, topic).await;
            let index = items.len() + 1;
            let outcome = if image_prompt.is_some() { "generated" } else { "failed" };
            info!(post = index, outcome, "Image prompt");
            items.push(WorkItem::new(body, index).with_image_prompt(image_prompt));
        }

        info!(count = items.len(), "Architect created posts");
        items
    }

    /// Single-line visual prompt for `text`, or `None` on any failure.
    pub async fn image_prompt(&self, text: &str, topic: &str) -> Option<String> {
        let prompt = prompts::image(&self.content, text, topic);

        match self
            .generator
            .generate(&prompt, self.timeouts.image_prompt())
            .await
        {
            Ok(raw) => {
                let line = normalize_text(&raw, usize::MAX);
                (!line.is_empty()).then_some(line)
            }
            Err(e) => {
                warn!(error = %e, "Image prompt failed");
                None
            }
        }
    }
}
