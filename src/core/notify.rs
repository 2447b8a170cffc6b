//! Turns pipeline events into operator notifications.
//!
//! Producers hold an `EventSink` and never wait on the channel. A single
//! subscriber task renders each event and sends it; a failed send is
//! logged and dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::adapters::{display_price, Notifier};
use crate::config::ContentSettings;
use crate::domain::PulseEvent;

/// Characters of post text shown in a publish notice
const PREVIEW_CHARS: usize = 150;

/// Sending half of the event channel
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<PulseEvent>,
}

impl EventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PulseEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Fire and forget
    pub fn emit(&self, event: PulseEvent) {
        if self.tx.send(event).is_err() {
            debug!("Event dropped, no subscriber");
        }
    }
}

/// Message text for an event.
pub fn render(event: &PulseEvent, content: &ContentSettings) -> String {
    let ticker = &content.ticker;

    let body = match event {
        PulseEvent::Started {
            refill_every,
            drain_every,
            heartbeat_every,
        } => format!(
            "🚀 *{} Bot Started!*\n\n🔄 New content every {}\n📤 One post every {}\n🔔 Updates for every new post\n💓 Heartbeat every {}",
            content.bot_name, refill_every, drain_every, heartbeat_every
        ),
        PulseEvent::TrendsFound { topics, price } => {
            let list = topics
                .iter()
                .map(|t| format!("• {}", t))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "🔍 *New Trends Found ({} topics)*\n\n{}\n\n💰 {}: {}",
                topics.len(),
                list,
                ticker,
                display_price(*price)
            )
        }
        PulseEvent::BatchGenerated {
            count,
            drain_every,
            price,
        } => format!(
            "✨ *Generated {} new posts*\n\n🎨 Each with its own image prompt\n📤 Posting every {}\n\n💰 {}: {}",
            count,
            drain_every,
            ticker,
            display_price(*price)
        ),
        PulseEvent::Published {
            index,
            preview,
            permalink,
            ..
        } => format!(
            "🐦 *Post #{} Live!*\n\n\"{}...\"\n\n🔗 {}",
            index,
            crate::domain::preview(preview, PREVIEW_CHARS),
            permalink
        ),
        PulseEvent::Heartbeat {
            queue_len,
            price,
            at,
        } => {
            // Heartbeats carry their own header
            return format!(
                "💓 *{} Heartbeat*\n\n✅ Bot is running\n📤 Queue: {} posts\n💰 {}: {}\n⏰ {}",
                content.bot_name,
                queue_len,
                ticker,
                display_price(*price),
                at.format("%H:%M:%S")
            );
        }
    };

    let mut text = format!("🔔 *{} Update*\n\n{}", content.bot_name, body);
    if let PulseEvent::Published {
        image_prompt: Some(prompt),
        ..
    } = event
    {
        text.push_str(&format!("\n\n🎨 *Image Prompt:* {}", prompt));
    }
    text
}

/// Spawn the subscriber. Without a notifier, events are only logged.
pub fn spawn_notifier(
    mut rx: mpsc::UnboundedReceiver<PulseEvent>,
    notifier: Option<Arc<dyn Notifier>>,
    content: ContentSettings,
    timeout: Duration,
) -> JoinHandle<()> {
    if notifier.is_none() {
        info!("Notification channel not configured, notifications disabled");
    }

    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Some(notifier) = notifier.as_ref() else {
                debug!(kind = event.kind(), "Notification skipped");
                continue;
            };

            let text = render(&event, &content);
            match notifier.notify(&text, timeout).await {
                Ok(()) => info!(kind = event.kind(), "Notification sent"),
                Err(e) => error!(kind = event.kind(), error = %e, "Notification failed"),
            }
        }
    })
}
