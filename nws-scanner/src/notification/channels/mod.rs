//! Notification channels.
//!
//! This module provides the outbound destinations for new alerts:
//! - Facebook page posts (Graph API)
//! - Twitter status updates (API v2, OAuth 1.0a user context)
//! - Email (SMTP)

pub mod email;
pub mod facebook;
pub mod oauth;
pub mod twitter;

pub use email::{EmailChannel, EmailConfig};
pub use facebook::{FacebookChannel, FacebookConfig};
pub use twitter::{TwitterChannel, TwitterConfig};

use async_trait::async_trait;

use crate::Result;
use crate::domain::AlertRecord;

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Get the channel type name.
    fn channel_type(&self) -> &'static str;

    /// Deliver one alert through this channel.
    async fn publish(&self, alert: &AlertRecord) -> Result<()>;
}

/// Mask a credential for logging, keeping only enough to tell values apart.
pub fn redact(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_hides_short_and_long_secrets() {
        assert_eq!(redact("abc"), "****");
        assert_eq!(redact("abcdefghijkl"), "abcd****");
    }
}
