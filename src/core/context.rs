//! The single owner of everything the triggers share.
//!
//! Queue, recent themes, counters, and the event sink live here and are
//! only touched through `PulseContext` methods. Each trigger operation
//! holds its own gate, so a second refill (or drain) that fires while the
//! previous one is still running is skipped instead of overlapping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::Mutex;
use tracing::{error, info, info_span, warn, Instrument};

use crate::adapters::{display_price, fetch_price, PriceFeed};
use crate::config::ScheduleSettings;
use crate::domain::{describe_period, PulseEvent, RecentThemes};

use super::notify::EventSink;
use super::pipeline::ContentPipeline;
use super::publisher::{Published, Publisher};
use super::queue::QueueHandle;

/// Result of one refill cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefillOutcome {
    /// Another refill was still running
    Busy,
    /// No generator configured
    Disabled,
    /// Discovery produced nothing
    NoTopics,
    /// Writing produced nothing
    NoItems,
    /// Items were appended
    Queued { added: usize, pending: usize },
    /// Items were generated but could not be stored
    QueueFailed,
}

/// Result of one drain tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Another drain was still running
    Busy,
    /// No platform configured
    Disabled,
    /// Nothing pending
    Empty,
    Published(Published),
    /// The item was popped and the post failed; it is not requeued
    Failed,
    /// The queue could not be read or written
    QueueFailed,
}

/// Result of one heartbeat
#[derive(Debug, Clone, PartialEq)]
pub struct HeartbeatReport {
    pub queue_len: usize,
    pub price: Option<f64>,
    pub notified: bool,
}

/// Shared state and services for the triggers
pub struct PulseContext {
    queue: QueueHandle,
    events: EventSink,
    price_feed: Arc<dyn PriceFeed>,
    price_timeout: Duration,
    schedule: ScheduleSettings,
    pipeline: Option<ContentPipeline>,
    publisher: Option<Publisher>,
    recent: Mutex<RecentThemes>,
    cycles: AtomicU64,
    heartbeats: AtomicU64,
    refill_gate: Mutex<()>,
    drain_gate: Mutex<()>,
}

impl PulseContext {
    pub fn new(
        queue: QueueHandle,
        events: EventSink,
        price_feed: Arc<dyn PriceFeed>,
        price_timeout: Duration,
        schedule: ScheduleSettings,
    ) -> Self {
        Self {
            queue,
            events,
            price_feed,
            price_timeout,
            schedule,
            pipeline: None,
            publisher: None,
            recent: Mutex::new(RecentThemes::new(0)),
            cycles: AtomicU64::new(0),
            heartbeats: AtomicU64::new(0),
            refill_gate: Mutex::new(()),
            drain_gate: Mutex::new(()),
        }
    }

    /// Enable refills
    pub fn with_pipeline(mut self, pipeline: ContentPipeline) -> Self {
        self.recent = Mutex::new(RecentThemes::new(pipeline.content().recent_themes));
        self.pipeline = Some(pipeline);
        self
    }

    /// Enable drains
    pub fn with_publisher(mut self, publisher: Publisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn queue(&self) -> &QueueHandle {
        &self.queue
    }

    pub fn schedule(&self) -> &ScheduleSettings {
        &self.schedule
    }

    /// Number of refill cycles started so far
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    pub async fn recent_themes(&self) -> Vec<String> {
        self.recent.lock().await.names().to_vec()
    }

    /// Scout, write, and queue one batch.
    pub async fn refill(&self) -> RefillOutcome {
        let Ok(_gate) = self.refill_gate.try_lock() else {
            warn!("Refill already running, skipping");
            return RefillOutcome::Busy;
        };

        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        self.run_cycle()
            .instrument(info_span!("cycle", cycle))
            .await
    }

    async fn run_cycle(&self) -> RefillOutcome {
        info!("Cycle started");

        let Some(pipeline) = self.pipeline.as_ref() else {
            warn!("Generation disabled, no generator configured");
            return RefillOutcome::Disabled;
        };

        let price = fetch_price(self.price_feed.as_ref(), self.price_timeout).await;
        let recent = self.recent_themes().await;

        let topics = pipeline.scout(price, &recent).await;
        if topics.is_empty() {
            info!("No trends found, skipping cycle");
            return RefillOutcome::NoTopics;
        }
        self.events.emit(PulseEvent::TrendsFound {
            topics: topics.iter().map(|t| t.name.clone()).collect(),
            price,
        });

        let items = pipeline.architect(&topics, price).await;
        if items.is_empty() {
            info!("No posts generated");
            return RefillOutcome::NoItems;
        }

        let added = items.len();
        match self.queue.append(items).await {
            Ok(pending) => {
                info!(added, pending, "Queue updated");
                self.recent.lock().await.remember(&topics);
                self.events.emit(PulseEvent::BatchGenerated {
                    count: added,
                    drain_every: describe_period(self.schedule.drain_every()),
                    price,
                });
                RefillOutcome::Queued { added, pending }
            }
            Err(e) => {
                error!(error = %e, "Failed to queue generated posts");
                RefillOutcome::QueueFailed
            }
        }
    }

    /// Pop one item and publish it.
    pub async fn drain(&self) -> DrainOutcome {
        let Ok(_gate) = self.drain_gate.try_lock() else {
            warn!("Drain already running, skipping");
            return DrainOutcome::Busy;
        };

        let Some(publisher) = self.publisher.as_ref() else {
            warn!("Publishing disabled, no platform configured");
            return DrainOutcome::Disabled;
        };

        let item = match self.queue.pop_front().await {
            Ok(Some(item)) => item,
            Ok(None) => return DrainOutcome::Empty,
            Err(e) => {
                error!(error = %e, "Failed to take next post");
                return DrainOutcome::QueueFailed;
            }
        };

        match publisher.publish(&item).await {
            Some(published) => {
                self.events.emit(published.event(&item));
                DrainOutcome::Published(published)
            }
            None => DrainOutcome::Failed,
        }
    }

    /// Log liveness and, on the configured cadence, notify.
    pub async fn heartbeat(&self) -> HeartbeatReport {
        let beat = self.heartbeats.fetch_add(1, Ordering::SeqCst) + 1;
        let price = fetch_price(self.price_feed.as_ref(), self.price_timeout).await;

        let queue_len = match self.queue.len().await {
            Ok(len) => len,
            Err(e) => {
                error!(error = %e, "Failed to read queue length");
                0
            }
        };

        info!(
            target: "heartbeat",
            queue = queue_len,
            price = %display_price(price),
            "Bot alive"
        );

        let every = u64::from(self.schedule.heartbeat_notify_every);
        let notified = every > 0 && beat % every == 0;
        if notified {
            self.events.emit(PulseEvent::Heartbeat {
                queue_len,
                price,
                at: Local::now(),
            });
        }

        HeartbeatReport {
            queue_len,
            price,
            notified,
        }
    }
}
