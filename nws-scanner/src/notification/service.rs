//! Fan-out of one alert to every enabled channel.
//!
//! Channels are attempted sequentially in configuration order. A failing
//! channel never prevents the remaining channels from being attempted; each
//! outcome is captured in a [`DeliveryReport`] for the caller to log.

use std::sync::Arc;

use reqwest::Client;
use tracing::{info, warn};

use super::channels::{EmailChannel, FacebookChannel, NotificationChannel, TwitterChannel};
use crate::Result;
use crate::config::{ChannelSetting, ChannelsConfig};
use crate::domain::AlertRecord;

/// Result of one channel's delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelOutcome {
    Delivered,
    Failed(String),
}

/// Per-channel outcomes for one alert.
#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    pub outcomes: Vec<(&'static str, ChannelOutcome)>,
}

impl DeliveryReport {
    /// Channels that accepted the alert.
    pub fn delivered(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.outcomes
            .iter()
            .filter(|(_, o)| *o == ChannelOutcome::Delivered)
            .map(|(name, _)| *name)
    }

    /// Channels that failed, with their error message.
    pub fn failed(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.outcomes.iter().filter_map(|(name, o)| match o {
            ChannelOutcome::Failed(msg) => Some((*name, msg.as_str())),
            ChannelOutcome::Delivered => None,
        })
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// Holds the enabled channels and delivers alerts to all of them.
#[derive(Clone, Default)]
pub struct NotificationService {
    channels: Vec<Arc<dyn NotificationChannel>>,
}

impl NotificationService {
    /// Service with no channels ("logging mode only").
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the enabled channels from configuration.
    ///
    /// Order is fixed: social post, microblog, email.
    pub fn from_config(config: &ChannelsConfig, client: Client) -> Result<Self> {
        let mut service = Self::new();

        if let ChannelSetting::Enabled(fb) = &config.facebook {
            service.add_channel(Arc::new(FacebookChannel::new(fb.clone(), client.clone())));
        }
        if let ChannelSetting::Enabled(tw) = &config.twitter {
            service.add_channel(Arc::new(TwitterChannel::new(tw.clone(), client.clone())));
        }
        if let ChannelSetting::Enabled(em) = &config.email {
            service.add_channel(Arc::new(EmailChannel::new(em)?));
        }

        Ok(service)
    }

    /// Append a channel after the existing ones.
    pub fn add_channel(&mut self, channel: Arc<dyn NotificationChannel>) {
        info!(channel = channel.channel_type(), "Notification channel enabled");
        self.channels.push(channel);
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel_types(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.channel_type()).collect()
    }

    /// Attempt delivery on every channel exactly once.
    pub async fn publish_all(&self, alert: &AlertRecord) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for channel in &self.channels {
            let name = channel.channel_type();
            let outcome = match channel.publish(alert).await {
                Ok(()) => {
                    info!(channel = name, alert_id = %alert.id, "Alert delivered");
                    ChannelOutcome::Delivered
                }
                Err(e) => {
                    warn!(channel = name, alert_id = %alert.id, error = %e, "Alert delivery failed");
                    ChannelOutcome::Failed(e.to_string())
                }
            };
            report.outcomes.push((name, outcome));
        }

        report
    }
}
