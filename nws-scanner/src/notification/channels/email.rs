//! Email notification channel using SMTP.

use std::fmt;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use super::{NotificationChannel, redact};
use crate::domain::AlertRecord;
use crate::{Error, Result};

/// Email channel configuration.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server host.
    pub smtp_host: String,
    /// SMTP server port.
    pub smtp_port: u16,
    /// SMTP login. Defaults to the sender address.
    pub smtp_username: String,
    /// Whether `smtp_username` fell back to the sender address.
    pub username_defaulted: bool,
    /// SMTP password.
    pub smtp_password: String,
    /// Require STARTTLS before authenticating. When false the upgrade is
    /// attempted but a server without STARTTLS is accepted.
    pub require_tls: bool,
    /// Sender email address.
    pub from_address: String,
    /// Recipient email addresses.
    pub to_addresses: Vec<String>,
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("username_defaulted", &self.username_defaulted)
            .field("smtp_password", &redact(&self.smtp_password))
            .field("require_tls", &self.require_tls)
            .field("from_address", &self.from_address)
            .field("to_addresses", &self.to_addresses)
            .finish()
    }
}

/// Email notification channel.
pub struct EmailChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl EmailChannel {
    /// Create a new Email channel.
    ///
    /// Fails when an address does not parse or TLS parameters cannot be built
    /// for the server name.
    pub fn new(config: &EmailConfig) -> Result<Self> {
        crate::utils::http_client::install_rustls_provider();

        let from: Mailbox = config
            .from_address
            .parse()
            .map_err(|e| Error::config(format!("invalid from address: {e}")))?;

        let to = config
            .to_addresses
            .iter()
            .map(|addr| {
                addr.parse::<Mailbox>()
                    .map_err(|e| Error::config(format!("invalid to address {addr:?}: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;
        if to.is_empty() {
            return Err(Error::config("no email recipients configured"));
        }

        let builder = if config.require_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .map_err(|e| Error::config(format!("SMTP relay error: {e}")))?
        } else {
            let parameters = TlsParameters::new(config.smtp_host.clone())
                .map_err(|e| Error::config(format!("SMTP TLS parameters: {e}")))?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
                .tls(Tls::Opportunistic(parameters))
        };

        let transport = builder
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from,
            to,
        })
    }

    /// Build the message: subject is the headline, body the regions and text.
    fn build_message(&self, alert: &AlertRecord) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(alert.headline.as_str())
            .header(ContentType::TEXT_PLAIN);
        for to in &self.to {
            builder = builder.to(to.clone());
        }

        builder
            .body(alert.region_and_body())
            .map_err(|e| Error::publish("email", format!("failed to build email: {e}")))
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn channel_type(&self) -> &'static str {
        "email"
    }

    async fn publish(&self, alert: &AlertRecord) -> Result<()> {
        let message = self.build_message(alert)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| Error::publish("email", format!("SMTP send failed: {e}")))?;

        debug!(alert_id = %alert.id, "Email sent");
        Ok(())
    }
}

/// Split a comma-separated recipient list, dropping empty entries.
pub(crate) fn split_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_username: "alerts@example.com".to_string(),
            username_defaulted: false,
            smtp_password: "hunter2-long-password".to_string(),
            require_tls: true,
            from_address: "alerts@example.com".to_string(),
            to_addresses: vec!["ops@example.com".to_string(), "oncall@example.com".to_string()],
        }
    }

    #[test]
    fn test_split_recipients() {
        assert_eq!(
            split_recipients(" a@example.com, ,b@example.com "),
            vec!["a@example.com", "b@example.com"]
        );
        assert!(split_recipients("").is_empty());
    }

    #[tokio::test]
    async fn test_build_message_headers_and_body() {
        let channel = EmailChannel::new(&config()).unwrap();
        let alert = AlertRecord::new("id", "Heat Advisory", "Bay County", "Stay hydrated.");

        let formatted = String::from_utf8(channel.build_message(&alert).unwrap().formatted()).unwrap();
        assert!(formatted.contains("Subject: Heat Advisory"));
        assert!(formatted.contains("From: alerts@example.com"));
        assert!(formatted.contains("ops@example.com"));
        assert!(formatted.contains("oncall@example.com"));
        assert!(formatted.contains("Affected region(s): Bay County"));
        assert!(formatted.contains("Stay hydrated."));
    }

    #[tokio::test]
    async fn test_opportunistic_tls_builds() {
        let mut config = config();
        config.require_tls = false;
        assert!(EmailChannel::new(&config).is_ok());
    }

    #[test]
    fn test_invalid_from_address() {
        let mut config = config();
        config.from_address = "not an address".to_string();
        assert!(matches!(EmailChannel::new(&config), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("hunter2"));
    }
}
