//! Facebook page post channel.
//!
//! Publishes to `POST /{page-id}/feed` on the Graph API with a page access token.

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::{NotificationChannel, redact};
use crate::Result;
use crate::domain::AlertRecord;

/// Graph API version the page feed endpoint is addressed with.
pub const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com/v3.0";

/// Facebook channel configuration.
#[derive(Clone)]
pub struct FacebookConfig {
    /// Page access token.
    pub access_token: String,
    /// Target page ID.
    pub page_id: String,
    /// Graph API base URL including the version segment.
    pub graph_api_base: String,
}

impl FacebookConfig {
    pub fn new(access_token: impl Into<String>, page_id: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            page_id: page_id.into(),
            graph_api_base: DEFAULT_GRAPH_API_BASE.to_string(),
        }
    }
}

impl fmt::Debug for FacebookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacebookConfig")
            .field("access_token", &redact(&self.access_token))
            .field("page_id", &self.page_id)
            .field("graph_api_base", &self.graph_api_base)
            .finish()
    }
}

/// Facebook notification channel.
pub struct FacebookChannel {
    config: FacebookConfig,
    client: Client,
}

impl FacebookChannel {
    /// Create a new Facebook channel.
    pub fn new(config: FacebookConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn feed_url(&self) -> String {
        format!(
            "{}/{}/feed",
            self.config.graph_api_base.trim_end_matches('/'),
            self.config.page_id
        )
    }

    /// Build the post text: headline, affected regions, then the full body.
    fn build_message(alert: &AlertRecord) -> String {
        format!("{}\n\n{}", alert.headline, alert.region_and_body())
    }
}

#[async_trait]
impl NotificationChannel for FacebookChannel {
    fn channel_type(&self) -> &'static str {
        "facebook"
    }

    async fn publish(&self, alert: &AlertRecord) -> Result<()> {
        let message = Self::build_message(alert);
        let form = [
            ("message", message.as_str()),
            ("access_token", self.config.access_token.as_str()),
        ];

        let response = self
            .client
            .post(self.feed_url())
            .form(&form)
            .send()
            .await
            .map_err(|e| crate::Error::publish("facebook", format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Facebook post failed: {} - {}", status, body);
            return Err(crate::Error::publish(
                "facebook",
                format!("{status} - {body}"),
            ));
        }

        debug!(alert_id = %alert.id, "Facebook post requested");
        Ok(())
    }
}
