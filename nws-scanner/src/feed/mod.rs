//! Alert source adapter.
//!
//! The dispatch loop only needs one operation from the feed: the current set
//! of active alerts for the configured zone, in feed order.

mod nws;

pub use nws::{NwsFeed, parse_response};

use std::time::Duration;

use async_trait::async_trait;

use crate::Result;
use crate::domain::AlertRecord;
use crate::utils::http_client;

/// Default NWS API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.weather.gov";

/// Source of active alerts.
#[async_trait]
pub trait AlertSource: Send + Sync {
    /// Zone identifier the source is filtered on.
    fn zone(&self) -> &str;

    /// Fetch the alerts currently active for the zone.
    ///
    /// Returns [`crate::Error::FeedInvalid`] when the feed rejects the query and
    /// [`crate::Error::Fetch`] for every other failure.
    async fn fetch_active_alerts(&self) -> Result<Vec<AlertRecord>>;
}

/// Feed configuration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// NWS zone identifier (e.g. `WAZ558`).
    pub zone_id: String,
    /// API base URL.
    pub api_base: String,
    /// User-Agent header; the NWS API rejects anonymous clients.
    pub user_agent: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl FeedConfig {
    pub fn new(zone_id: impl Into<String>) -> Self {
        Self {
            zone_id: zone_id.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: http_client::default_user_agent(),
            request_timeout: http_client::DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
