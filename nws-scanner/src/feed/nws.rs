//! National Weather Service active-alerts client.
//!
//! Queries `GET /alerts/active?status=actual&message_type=alert&zone=<zone>`
//! and maps each GeoJSON feature's properties to an [`AlertRecord`].

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, trace, warn};

use super::{AlertSource, FeedConfig};
use crate::domain::AlertRecord;
use crate::{Error, Result};

/// Marker the feed puts in `title` when it rejects the query parameters.
const INVALID_TITLE_MARKER: &str = "Invalid";

/// Maximum body length echoed into error messages.
const ERROR_BODY_SNIPPET: usize = 200;

#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    features: Option<Vec<Feature>>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: AlertProperties,
}

#[derive(Debug, Deserialize)]
struct AlertProperties {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    headline: Option<String>,
    #[serde(default, rename = "areaDesc")]
    area_desc: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl AlertProperties {
    fn into_record(self) -> Option<AlertRecord> {
        let id = self.id.filter(|id| !id.trim().is_empty())?;
        Some(AlertRecord {
            id,
            headline: self.headline.unwrap_or_default(),
            area_description: self.area_desc.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
        })
    }
}

/// Alert source backed by `api.weather.gov`.
pub struct NwsFeed {
    config: FeedConfig,
    client: Client,
}

impl NwsFeed {
    pub fn new(config: FeedConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Full request URL for the configured zone.
    pub fn alerts_url(&self) -> String {
        format!(
            "{}/alerts/active?status=actual&message_type=alert&zone={}",
            self.config.api_base.trim_end_matches('/'),
            urlencoding::encode(&self.config.zone_id)
        )
    }
}

#[async_trait]
impl AlertSource for NwsFeed {
    fn zone(&self) -> &str {
        &self.config.zone_id
    }

    async fn fetch_active_alerts(&self) -> Result<Vec<AlertRecord>> {
        let url = self.alerts_url();
        trace!(url = %url, "Fetching active alerts");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/geo+json")
            .send()
            .await
            .map_err(|e| Error::fetch(format!("request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::fetch(format!("failed to read response body: {e}")))?;

        let alerts = parse_response(status, &body)?;
        debug!(zone = %self.config.zone_id, count = alerts.len(), "Fetched active alerts");
        Ok(alerts)
    }
}

/// Interpret a feed response.
///
/// A title containing `"Invalid"` or an HTTP 400 means the query itself was
/// rejected ([`Error::FeedInvalid`]); any other failure is a transient
/// [`Error::Fetch`].
pub fn parse_response(status: u16, body: &str) -> Result<Vec<AlertRecord>> {
    let parsed: FeedResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) if status == 400 => {
            trace!(error = %e, "Unparsable HTTP 400 body");
            return Err(Error::FeedInvalid(format!("HTTP 400: {}", snippet(body))));
        }
        Err(e) => {
            return Err(Error::fetch(format!(
                "malformed payload (HTTP {status}): {e}"
            )));
        }
    };

    let summary = || {
        parsed
            .detail
            .as_deref()
            .or(parsed.title.as_deref())
            .unwrap_or("no detail")
            .to_string()
    };

    if let Some(title) = parsed.title.as_deref()
        && title.contains(INVALID_TITLE_MARKER)
    {
        return Err(Error::FeedInvalid(title.to_string()));
    }
    if status == 400 {
        return Err(Error::FeedInvalid(format!("HTTP 400: {}", summary())));
    }
    if !(200..300).contains(&status) {
        return Err(Error::fetch(format!("HTTP {status}: {}", summary())));
    }

    let features = parsed
        .features
        .ok_or_else(|| Error::fetch("payload has no features"))?;

    Ok(features
        .into_iter()
        .filter_map(|feature| {
            let record = feature.properties.into_record();
            if record.is_none() {
                warn!("Skipping feed entry without an alert id");
            }
            record
        })
        .collect())
}

fn snippet(body: &str) -> String {
    body.chars().take(ERROR_BODY_SNIPPET).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "title": "Current watches, warnings, and advisories for Washington",
        "features": [
            {
                "id": "https://api.weather.gov/alerts/urn:oid:2.49.0.1.840.0.a",
                "type": "Feature",
                "properties": {
                    "id": "urn:oid:2.49.0.1.840.0.a",
                    "areaDesc": "Bay County; King County",
                    "headline": "Flood Warning issued by NWS Seattle",
                    "description": "Rivers will rise.",
                    "severity": "Severe"
                }
            },
            {
                "properties": {
                    "id": "urn:oid:2.49.0.1.840.0.b",
                    "areaDesc": "Pierce County",
                    "headline": null,
                    "description": "Fog."
                }
            },
            {
                "properties": { "headline": "no id here" }
            }
        ]
    }"#;

    #[test]
    fn parses_features_in_order() {
        let alerts = parse_response(200, SAMPLE).unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(
            alerts[0],
            AlertRecord::new(
                "urn:oid:2.49.0.1.840.0.a",
                "Flood Warning issued by NWS Seattle",
                "Bay County; King County",
                "Rivers will rise."
            )
        );
        assert_eq!(alerts[1].id, "urn:oid:2.49.0.1.840.0.b");
        assert_eq!(alerts[1].headline, "");
    }

    #[test]
    fn empty_feature_list() {
        let body = r#"{"title": "Current watches", "features": []}"#;
        assert!(parse_response(200, body).unwrap().is_empty());
    }

    #[test]
    fn invalid_title_is_feed_invalid() {
        let body = r#"{"title": "Invalid Parameter", "features": []}"#;
        assert!(matches!(parse_response(200, body), Err(Error::FeedInvalid(_))));
    }

    #[test]
    fn bad_request_is_feed_invalid() {
        let body = r#"{"title": "Bad Request", "detail": "Parameter \"zone\" is invalid", "status": 400}"#;
        let err = parse_response(400, body).unwrap_err();
        assert!(err.is_feed_invalid());
        assert!(err.to_string().contains("zone"));
    }

    #[test]
    fn server_error_is_fetch_failure() {
        let body = r#"{"title": "Unexpected Problem", "status": 500}"#;
        assert!(matches!(parse_response(500, body), Err(Error::Fetch(_))));
    }

    #[test]
    fn malformed_json_is_fetch_failure() {
        assert!(matches!(parse_response(200, "<html>"), Err(Error::Fetch(_))));
        assert!(matches!(parse_response(400, "<html>"), Err(Error::FeedInvalid(_))));
    }

    #[test]
    fn missing_features_is_fetch_failure() {
        let body = r#"{"title": "Current watches"}"#;
        assert!(matches!(parse_response(200, body), Err(Error::Fetch(_))));
    }

    #[test]
    fn alerts_url_includes_zone() {
        let config = FeedConfig {
            api_base: "https://api.weather.gov/".to_string(),
            ..FeedConfig::new("WAZ558")
        };
        let client = crate::utils::http_client::build_client("test", std::time::Duration::ZERO).unwrap();
        let feed = NwsFeed::new(config, client);
        assert_eq!(
            feed.alerts_url(),
            "https://api.weather.gov/alerts/active?status=actual&message_type=alert&zone=WAZ558"
        );
    }
}
