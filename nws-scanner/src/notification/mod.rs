//! Notification system module.
//!
//! Delivers newly seen alerts through every configured channel (Facebook,
//! Twitter, Email). Channels are independent: one failing does not stop the
//! others, and no delivery is retried.

pub mod channels;
pub mod service;

pub use channels::{EmailConfig, FacebookConfig, NotificationChannel, TwitterConfig};
pub use service::{ChannelOutcome, DeliveryReport, NotificationService};
