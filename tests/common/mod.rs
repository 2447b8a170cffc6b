//! Scripted adapters and context wiring shared by the integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use pulse::adapters::{Generator, Platform, PriceFeed};
use pulse::config::{ContentSettings, ScheduleSettings, TimeoutSettings};
use pulse::core::{ContentPipeline, EventSink, Publisher, PulseContext, QueueHandle, WorkQueue};
use pulse::domain::PulseEvent;

/// Canned reply for one kind of request; `None` fails the call
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub scout: Option<String>,
    pub architect: Option<String>,
    pub image: Option<String>,
}

/// Generator that answers by request kind and records every prompt
#[derive(Default)]
pub struct ScriptedGenerator {
    script: Script,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls_matching(&self, needle: &str) -> usize {
        self.prompts().iter().filter(|p| p.contains(needle)).count()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str, _timeout: Duration) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let reply = if prompt.starts_with("You are the SCOUT") {
            &self.script.scout
        } else if prompt.starts_with("You are the ARCHITECT") {
            &self.script.architect
        } else {
            &self.script.image
        };
        reply.clone().ok_or_else(|| anyhow!("generator unavailable"))
    }
}

/// Price feed with a fixed answer
pub struct FixedFeed(pub Option<f64>);

#[async_trait]
impl PriceFeed for FixedFeed {
    async fn spot(&self, _timeout: Duration) -> Result<f64> {
        self.0.ok_or_else(|| anyhow!("price endpoint unreachable"))
    }
}

/// Platform that records posts, or rejects all of them
#[derive(Default)]
pub struct RecordingPlatform {
    pub reject: bool,
    pub posts: Mutex<Vec<String>>,
}

#[async_trait]
impl Platform for RecordingPlatform {
    async fn post(&self, text: &str, _timeout: Duration) -> Result<String> {
        if self.reject {
            return Err(anyhow!("403 Forbidden"));
        }
        let mut posts = self.posts.lock().unwrap();
        posts.push(text.to_string());
        Ok(format!("{}", 1000 + posts.len()))
    }

    fn permalink(&self, post_id: &str) -> String {
        format!("https://x.com/i/web/status/{}", post_id)
    }
}

pub fn topics_json(names: &[&str]) -> String {
    let topics: Vec<String> = names
        .iter()
        .map(|n| format!(r#"{{"topic":"{}","who":"N/A","statement":"","impact":"moves price"}}"#, n))
        .collect();
    format!("Here you go:\n```json\n[{}]\n```", topics.join(","))
}

pub fn posts_json(bodies: &[&str]) -> String {
    let posts: Vec<String> = bodies
        .iter()
        .map(|b| format!(r#"{{"post":"{}"}}"#, b))
        .collect();
    format!("[{}]", posts.join(","))
}

/// Context over a queue file at `queue_path`, with the event stream exposed
pub async fn context(
    queue_path: &Path,
    generator: Option<Arc<dyn Generator>>,
    platform: Option<Arc<dyn Platform>>,
    price: Option<f64>,
) -> (Arc<PulseContext>, UnboundedReceiver<PulseEvent>) {
    context_with_schedule(queue_path, generator, platform, price, ScheduleSettings::default()).await
}

pub async fn context_with_schedule(
    queue_path: &Path,
    generator: Option<Arc<dyn Generator>>,
    platform: Option<Arc<dyn Platform>>,
    price: Option<f64>,
    schedule: ScheduleSettings,
) -> (Arc<PulseContext>, UnboundedReceiver<PulseEvent>) {
    let (events, rx) = EventSink::channel();
    let queue = QueueHandle::spawn(WorkQueue::load(queue_path).await);

    let mut ctx = PulseContext::new(
        queue,
        events,
        Arc::new(FixedFeed(price)),
        Duration::from_secs(1),
        schedule,
    );
    if let Some(generator) = generator {
        ctx = ctx.with_pipeline(ContentPipeline::new(
            generator,
            ContentSettings::default(),
            TimeoutSettings::default(),
        ));
    }
    if let Some(platform) = platform {
        ctx = ctx.with_publisher(Publisher::new(platform, 600, Duration::from_secs(1)));
    }

    (Arc::new(ctx), rx)
}

/// Everything emitted so far
pub fn drain_events(rx: &mut UnboundedReceiver<PulseEvent>) -> Vec<PulseEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
