//! Twitter status update channel.
//!
//! Posts `{"text": ...}` to the v2 `tweets` endpoint on behalf of the
//! configured account, signed with OAuth 1.0a user-context credentials.

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use super::oauth::{self, OAuthCredentials, RequestNonce};
use super::{NotificationChannel, redact};
use crate::Result;
use crate::domain::AlertRecord;

/// Default tweet creation endpoint.
pub const DEFAULT_TWEETS_URL: &str = "https://api.twitter.com/2/tweets";

/// Tweet length limit (characters).
const TWEET_LIMIT: usize = 280;

/// Twitter channel configuration.
#[derive(Clone)]
pub struct TwitterConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_secret: String,
    /// Counties to call out when they appear in an alert's area description.
    /// `None` leaves the status as the bare headline.
    pub counties: Option<Vec<String>>,
    /// Tweet creation endpoint.
    pub tweets_url: String,
}

impl TwitterConfig {
    fn credentials(&self) -> OAuthCredentials {
        OAuthCredentials {
            consumer_key: self.consumer_key.clone(),
            consumer_secret: self.consumer_secret.clone(),
            token: self.access_token.clone(),
            token_secret: self.access_secret.clone(),
        }
    }
}

impl fmt::Debug for TwitterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwitterConfig")
            .field("consumer_key", &redact(&self.consumer_key))
            .field("consumer_secret", &redact(&self.consumer_secret))
            .field("access_token", &redact(&self.access_token))
            .field("access_secret", &redact(&self.access_secret))
            .field("counties", &self.counties)
            .field("tweets_url", &self.tweets_url)
            .finish()
    }
}

/// Twitter notification channel.
pub struct TwitterChannel {
    config: TwitterConfig,
    credentials: OAuthCredentials,
    client: Client,
}

impl TwitterChannel {
    /// Create a new Twitter channel.
    pub fn new(config: TwitterConfig, client: Client) -> Self {
        let credentials = config.credentials();
        Self {
            config,
            credentials,
            client,
        }
    }

    /// Build the status text: the headline followed by the matching counties.
    ///
    /// With a county list configured the suffix is `" for counties: "` and
    /// each county found in the area description followed by one space.
    pub fn build_status(&self, alert: &AlertRecord) -> String {
        let mut status = alert.headline.clone();

        if let Some(counties) = &self.config.counties {
            status.push_str(" for counties: ");
            for county in counties
                .iter()
                .filter(|c| alert.area_description.contains(c.as_str()))
            {
                status.push_str(county);
                status.push(' ');
            }
        }

        truncate_status(&status, TWEET_LIMIT)
    }
}

#[async_trait]
impl NotificationChannel for TwitterChannel {
    fn channel_type(&self) -> &'static str {
        "twitter"
    }

    async fn publish(&self, alert: &AlertRecord) -> Result<()> {
        let text = self.build_status(alert);
        let authorization = oauth::authorization_header(
            &self.credentials,
            "POST",
            &self.config.tweets_url,
            &[],
            &RequestNonce::generate(),
        )?;

        let response = self
            .client
            .post(&self.config.tweets_url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| crate::Error::publish("twitter", format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Tweet failed: {} - {}", status, body);
            return Err(crate::Error::publish("twitter", format!("{status} - {body}")));
        }

        debug!(alert_id = %alert.id, "Tweet post requested");
        Ok(())
    }
}

/// Truncate a status to fit within the tweet character limit.
fn truncate_status(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let suffix = "…";
    let budget = limit - suffix.chars().count();
    let truncated: String = text.chars().take(budget).collect();
    format!("{truncated}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(counties: Option<Vec<&str>>) -> TwitterChannel {
        let config = TwitterConfig {
            consumer_key: "ck".to_string(),
            consumer_secret: "cs".to_string(),
            access_token: "at".to_string(),
            access_secret: "as".to_string(),
            counties: counties.map(|c| c.into_iter().map(String::from).collect()),
            tweets_url: DEFAULT_TWEETS_URL.to_string(),
        };
        let client = crate::utils::http_client::build_client("test", std::time::Duration::ZERO).unwrap();
        TwitterChannel::new(config, client)
    }

    fn alert(area: &str) -> AlertRecord {
        AlertRecord::new("X", "Flood Warning", area, "body")
    }

    #[test]
    fn test_status_lists_matching_counties() {
        let channel = channel(Some(vec!["Bay", "King"]));
        assert_eq!(
            channel.build_status(&alert("Bay County, Pierce County")),
            "Flood Warning for counties: Bay "
        );
    }

    #[test]
    fn test_status_keeps_configured_order() {
        let channel = channel(Some(vec!["King", "Bay"]));
        assert_eq!(
            channel.build_status(&alert("Bay County; King County")),
            "Flood Warning for counties: King Bay "
        );
    }

    #[test]
    fn test_status_with_no_matches() {
        let channel = channel(Some(vec!["Lake"]));
        assert_eq!(
            channel.build_status(&alert("Bay County")),
            "Flood Warning for counties: "
        );
    }

    #[test]
    fn test_status_without_county_list() {
        let channel = channel(None);
        assert_eq!(channel.build_status(&alert("Bay County")), "Flood Warning");
    }

    #[test]
    fn test_truncate_status() {
        assert_eq!(truncate_status("short", 280), "short");

        let long = "a".repeat(400);
        let truncated = truncate_status(&long, TWEET_LIMIT);
        assert_eq!(truncated.chars().count(), TWEET_LIMIT);
        assert!(truncated.ends_with('…'));
    }
}
