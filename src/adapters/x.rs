//! X (Twitter) v2 posting adapter.
//!
//! Endpoint: POST https://api.twitter.com/2/tweets
//! Auth: OAuth 1.0a user context, HMAC-SHA1, from four static credentials.
//! The JSON body is not part of the signature base string.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha1::Sha1;

use super::Platform;

const TWEETS_URL: &str = "https://api.twitter.com/2/tweets";

/// App and user tokens for OAuth 1.0a
#[derive(Clone, Serialize, Deserialize)]
pub struct XCredentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_secret: String,
}

/// Posting client for the X API
pub struct XClient {
    credentials: XCredentials,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TweetResponse {
    data: Option<TweetData>,
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
}

/// RFC 3986 percent-encoding: everything but unreserved characters.
pub fn percent_encode(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

/// HMAC-SHA1 signature over the OAuth base string.
///
/// `params` holds every signed parameter (oauth_* plus any query/form
/// parameters), unencoded.
pub fn sign(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    consumer_secret: &str,
    token_secret: &str,
) -> Result<String> {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let base = format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&param_string)
    );
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );

    let mut mac =
        Hmac::<Sha1>::new_from_slice(key.as_bytes()).context("Invalid OAuth signing key")?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

impl XClient {
    pub fn new(credentials: XCredentials) -> Self {
        Self {
            credentials,
            client: reqwest::Client::new(),
        }
    }

    /// Build the `Authorization` header for one request
    fn authorization(&self, method: &str, url: &str, nonce: &str, timestamp: &str) -> Result<String> {
        let creds = &self.credentials;
        let mut oauth = vec![
            ("oauth_consumer_key", creds.api_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp),
            ("oauth_token", creds.access_token.as_str()),
            ("oauth_version", "1.0"),
        ];

        let signature = sign(method, url, &oauth, &creds.api_secret, &creds.access_secret)?;
        oauth.push(("oauth_signature", signature.as_str()));
        oauth.sort();

        let fields = oauth
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {}", fields))
    }
}

#[async_trait]
impl Platform for XClient {
    async fn post(&self, text: &str, timeout: Duration) -> Result<String> {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let auth = self.authorization("POST", TWEETS_URL, &nonce, &timestamp)?;

        let response = self
            .client
            .post(TWEETS_URL)
            .header("Authorization", auth)
            .json(&serde_json::json!({ "text": text }))
            .timeout(timeout)
            .send()
            .await
            .context("Failed to reach X API")?;

        let status = response.status();
        let body: TweetResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse X response ({})", status))?;

        match body.data {
            Some(data) if status.is_success() => Ok(data.id),
            _ => anyhow::bail!(
                "X API error ({}): {}",
                status,
                body.detail.unwrap_or_default()
            ),
        }
    }

    fn permalink(&self, post_id: &str) -> String {
        format!("https://x.com/i/web/status/{}", post_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> XClient {
        XClient::new(XCredentials {
            api_key: "xvz1evFS4wEEPTGEFPHBog".to_string(),
            api_secret: "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw".to_string(),
            access_token: "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb".to_string(),
            access_secret: "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE".to_string(),
        })
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(
            percent_encode("Hello Ladies + Gentlemen, a signed OAuth request!"),
            "Hello%20Ladies%20%2B%20Gentlemen%2C%20a%20signed%20OAuth%20request%21"
        );
        assert_eq!(percent_encode("a-b.c_d~e"), "a-b.c_d~e");
        assert_eq!(percent_encode("₿"), "%E2%82%BF");
    }

    #[test]
    fn test_signature_matches_published_example() {
        let params = [
            ("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
            ("include_entities", "true"),
            ("oauth_consumer_key", "xvz1evFS4wEEPTGEFPHBog"),
            ("oauth_nonce", "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg"),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", "1318622958"),
            ("oauth_token", "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb"),
            ("oauth_version", "1.0"),
        ];

        let signature = sign(
            "post",
            "https://api.twitter.com/1.1/statuses/update.json",
            &params,
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
            "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
        )
        .unwrap();

        assert_eq!(signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    #[test]
    fn test_authorization_header_shape() {
        let header = client()
            .authorization("POST", TWEETS_URL, "abc123", "1700000000")
            .unwrap();

        assert!(header.starts_with("OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\""));
        assert!(header.contains("oauth_nonce=\"abc123\""));
        assert!(header.contains("oauth_signature=\""));
        assert!(header.contains("oauth_version=\"1.0\""));
    }

    #[test]
    fn test_permalink() {
        assert_eq!(client().permalink("42"), "https://x.com/i/web/status/42");
    }
}
