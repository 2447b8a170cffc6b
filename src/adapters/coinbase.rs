//! Coinbase public spot-price feed.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::PriceFeed;

/// Spot price for one currency pair, e.g. `BTC-USD`
pub struct CoinbaseFeed {
    pair: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SpotResponse {
    data: SpotData,
}

#[derive(Debug, Deserialize)]
struct SpotData {
    amount: String,
}

impl CoinbaseFeed {
    pub fn new(pair: impl Into<String>) -> Self {
        Self {
            pair: pair.into(),
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self) -> String {
        format!("https://api.coinbase.com/v2/prices/{}/spot", self.pair)
    }
}

fn parse_amount(body: SpotResponse) -> Result<f64> {
    body.data
        .amount
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Malformed spot amount: {:?}", body.data.amount))
}

#[async_trait]
impl PriceFeed for CoinbaseFeed {
    async fn spot(&self, timeout: Duration) -> Result<f64> {
        let response = self
            .client
            .get(self.api_url())
            .timeout(timeout)
            .send()
            .await
            .context("Failed to reach price feed")?;

        if !response.status().is_success() {
            anyhow::bail!("Price feed returned {}", response.status());
        }

        let body: SpotResponse = response
            .json()
            .await
            .context("Failed to parse price feed response")?;

        parse_amount(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url() {
        let feed = CoinbaseFeed::new("BTC-USD");
        assert_eq!(feed.api_url(), "https://api.coinbase.com/v2/prices/BTC-USD/spot");
    }

    #[test]
    fn test_parse_amount() {
        let body: SpotResponse = serde_json::from_str(
            r#"{"data":{"amount":"67012.34","base":"BTC","currency":"USD"}}"#,
        )
        .unwrap();
        assert_eq!(parse_amount(body).unwrap(), 67012.34);

        let bad: SpotResponse = serde_json::from_str(r#"{"data":{"amount":"n/a"}}"#).unwrap();
        assert!(parse_amount(bad).is_err());
    }
}
