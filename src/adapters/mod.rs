//! Adapter interfaces for external systems.
//!
//! Every network endpoint the pipeline talks to sits behind one of these
//! traits. Implementations return `Err` on any failure; deciding whether a
//! failure matters is the caller's job.

pub mod coinbase;
pub mod gemini;
pub mod telegram;
pub mod x;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

pub use coinbase::CoinbaseFeed;
pub use gemini::GeminiClient;
pub use telegram::{TelegramClient, TelegramConfig};
pub use x::{XClient, XCredentials};

/// Generative-AI endpoint: natural-language instruction in, free text out
#[async_trait]
pub trait Generator: Send + Sync {
    /// Human-readable adapter name
    fn name(&self) -> &str;

    /// Run one instruction, giving up after `timeout`
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String>;
}

/// Spot price source
#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn spot(&self, timeout: Duration) -> Result<f64>;
}

/// Human-facing status channel
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str, timeout: Duration) -> Result<()>;
}

/// Social platform that accepts short text posts
#[async_trait]
pub trait Platform: Send + Sync {
    /// Publish `text`, returning the platform-assigned post id
    async fn post(&self, text: &str, timeout: Duration) -> Result<String>;

    /// Public link for a post id
    fn permalink(&self, post_id: &str) -> String;
}

/// Current price, or `None` when the feed is unavailable for any reason.
pub async fn fetch_price(feed: &dyn PriceFeed, timeout: Duration) -> Option<f64> {
    match feed.spot(timeout).await {
        Ok(price) => Some(price),
        Err(e) => {
            debug!(error = %e, "Price unavailable");
            None
        }
    }
}

/// Render a price with thousands separators ("$67,123.45"), or "N/A".
pub fn display_price(price: Option<f64>) -> String {
    let Some(price) = price.filter(|p| p.is_finite()) else {
        return "N/A".to_string();
    };

    let cents = (price.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if price < 0.0 { "-" } else { "" };
    match frac {
        0 => format!("{}${}", sign, grouped),
        f if f % 10 == 0 => format!("{}${}.{}", sign, grouped, f / 10),
        f => format!("{}${}.{:02}", sign, grouped, f),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DownFeed;

    #[async_trait]
    impl PriceFeed for DownFeed {
        async fn spot(&self, _timeout: Duration) -> Result<f64> {
            anyhow::bail!("timed out")
        }
    }

    #[tokio::test]
    async fn test_fetch_price_swallows_failure() {
        assert_eq!(fetch_price(&DownFeed, Duration::from_millis(10)).await, None);
    }

    #[test]
    fn test_display_price() {
        assert_eq!(display_price(None), "N/A");
        assert_eq!(display_price(Some(f64::NAN)), "N/A");
        assert_eq!(display_price(Some(67123.456)), "$67,123.46");
        assert_eq!(display_price(Some(1_234_567.5)), "$1,234,567.5");
        assert_eq!(display_price(Some(999.0)), "$999");
    }
}
