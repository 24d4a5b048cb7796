//! Startup configuration.
//!
//! Everything is read from the environment once, validated, and frozen into an
//! [`AppConfig`]. Each notification channel resolves to either
//! [`ChannelSetting::Enabled`] with its credentials or
//! [`ChannelSetting::Disabled`] listing the keys that were missing.

mod env;

pub use env::keys;

use std::path::PathBuf;

use tracing::{info, warn};

use crate::feed::FeedConfig;
use crate::notification::{EmailConfig, FacebookConfig, TwitterConfig};
use crate::scanner::ScannerConfig;

/// Default log directory.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Whether a channel is provisioned.
#[derive(Debug, Clone)]
pub enum ChannelSetting<T> {
    Enabled(T),
    Disabled {
        /// Required keys absent from a partially configured group. Empty
        /// when none of the group's keys were set.
        missing: Vec<&'static str>,
    },
}

impl<T> ChannelSetting<T> {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }

    pub fn as_enabled(&self) -> Option<&T> {
        match self {
            Self::Enabled(config) => Some(config),
            Self::Disabled { .. } => None,
        }
    }
}

impl<T> Default for ChannelSetting<T> {
    fn default() -> Self {
        Self::Disabled {
            missing: Vec::new(),
        }
    }
}

/// Per-channel settings.
#[derive(Debug, Clone, Default)]
pub struct ChannelsConfig {
    pub facebook: ChannelSetting<FacebookConfig>,
    pub twitter: ChannelSetting<TwitterConfig>,
    pub email: ChannelSetting<EmailConfig>,
}

impl ChannelsConfig {
    pub fn any_enabled(&self) -> bool {
        self.facebook.is_enabled() || self.twitter.is_enabled() || self.email.is_enabled()
    }
}

/// Complete, immutable application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub scanner: ScannerConfig,
    pub channels: ChannelsConfig,
    pub log_dir: PathBuf,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        env::resolve(&lookup)
    }

    /// Log the effective configuration with credentials redacted.
    pub fn log_summary(&self) {
        info!(
            zone = %self.feed.zone_id,
            alert_cap = self.scanner.alert_cap.get(),
            poll_interval = ?self.scanner.poll_interval,
            state_file = %self.scanner.state_file.display(),
            on_invalid_feed = %self.scanner.on_invalid_feed,
            "Feed configuration"
        );

        log_channel("Facebook", &self.channels.facebook);
        log_channel("Twitter", &self.channels.twitter);
        log_channel("Email", &self.channels.email);

        if let Some(tw) = self.channels.twitter.as_enabled()
            && tw.counties.is_none()
        {
            info!("Twitter counties not set; tweets will carry the headline only");
        }
        if let Some(em) = self.channels.email.as_enabled()
            && em.username_defaulted
        {
            info!(username = %em.smtp_username, "No SMTP username provided, logging in with the sender address");
        }

        if !self.channels.any_enabled() {
            info!("No post / email options set. Logging mode only.");
        }
    }
}

fn log_channel<T: std::fmt::Debug>(name: &str, setting: &ChannelSetting<T>) {
    match setting {
        ChannelSetting::Enabled(config) => info!(channel = name, config = ?config, "Channel provisioned"),
        ChannelSetting::Disabled { missing } if missing.is_empty() => {
            info!(channel = name, "Channel not provisioned")
        }
        ChannelSetting::Disabled { missing } => {
            warn!(channel = name, missing = ?missing, "Channel partially configured; disabled")
        }
    }
}
