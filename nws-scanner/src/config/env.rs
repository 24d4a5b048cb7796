//! Environment variable resolution.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use super::{AppConfig, ChannelSetting, ChannelsConfig, DEFAULT_LOG_DIR};
use crate::feed::FeedConfig;
use crate::notification::channels::email::split_recipients;
use crate::notification::channels::facebook::DEFAULT_GRAPH_API_BASE;
use crate::notification::channels::twitter::DEFAULT_TWEETS_URL;
use crate::notification::{EmailConfig, FacebookConfig, TwitterConfig};
use crate::scanner::{FeedInvalidPolicy, ScannerConfig};
use crate::{Error, Result};

/// Environment variable names.
pub mod keys {
    pub const NWS_ZONE_ID: &str = "NWS_ZONE_ID";
    pub const NWS_ALERT_CAP: &str = "NWS_ALERT_CAP";
    pub const NWS_POLL_INTERVAL_SECS: &str = "NWS_POLL_INTERVAL_SECS";
    pub const NWS_STATE_FILE: &str = "NWS_STATE_FILE";
    pub const NWS_API_BASE: &str = "NWS_API_BASE";
    pub const NWS_USER_AGENT: &str = "NWS_USER_AGENT";
    pub const NWS_ON_INVALID_FEED: &str = "NWS_ON_INVALID_FEED";

    pub const FB_ACCESS_TOKEN: &str = "FB_ACCESS_TOKEN";
    pub const FB_PAGE_ID: &str = "FB_PAGE_ID";

    pub const TW_CONSUMER_KEY: &str = "TW_CONSUMER_KEY";
    pub const TW_CONSUMER_SECRET: &str = "TW_CONSUMER_SECRET";
    pub const TW_ACCESS_TOKEN: &str = "TW_ACCESS_TOKEN";
    pub const TW_ACCESS_SECRET: &str = "TW_ACCESS_SECRET";
    pub const TW_COUNTIES: &str = "TW_COUNTIES";

    pub const EM_SERVER: &str = "EM_SERVER";
    pub const EM_PORT: &str = "EM_PORT";
    pub const EM_FROM: &str = "EM_FROM";
    pub const EM_TO: &str = "EM_TO";
    pub const EM_SECURE: &str = "EM_SECURE";
    pub const EM_PASS: &str = "EM_PASS";
    pub const EM_USERNAME: &str = "EM_USERNAME";

    pub const LOG_DIR: &str = "LOG_DIR";
}

const FEED_GROUP: [&str; 2] = [keys::NWS_ZONE_ID, keys::NWS_ALERT_CAP];
const FACEBOOK_GROUP: [&str; 2] = [keys::FB_ACCESS_TOKEN, keys::FB_PAGE_ID];
const TWITTER_GROUP: [&str; 4] = [
    keys::TW_CONSUMER_KEY,
    keys::TW_CONSUMER_SECRET,
    keys::TW_ACCESS_TOKEN,
    keys::TW_ACCESS_SECRET,
];
const EMAIL_GROUP: [&str; 6] = [
    keys::EM_SERVER,
    keys::EM_PORT,
    keys::EM_FROM,
    keys::EM_TO,
    keys::EM_SECURE,
    keys::EM_PASS,
];

/// Lookup wrapper that treats blank values as unset.
struct Env<'a, F> {
    lookup: &'a F,
}

impl<F> Env<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Resolve every key of a group, or report which ones are missing.
    ///
    /// `Err(vec![])` means the group is entirely unset.
    fn group<const N: usize>(
        &self,
        group: [&'static str; N],
    ) -> std::result::Result<[String; N], Vec<&'static str>> {
        let values = group.map(|key| self.get(key));
        let missing: Vec<&'static str> = group
            .iter()
            .zip(values.iter())
            .filter(|(_, v)| v.is_none())
            .map(|(k, _)| *k)
            .collect();

        if missing.is_empty() {
            Ok(values.map(Option::unwrap_or_default))
        } else if missing.len() == N {
            Err(Vec::new())
        } else {
            Err(missing)
        }
    }
}

pub(super) fn resolve<F>(lookup: &F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let env = Env { lookup };

    let [zone_id, alert_cap] = env.group(FEED_GROUP).map_err(|missing| {
        let missing = if missing.is_empty() {
            FEED_GROUP.to_vec()
        } else {
            missing
        };
        Error::config(format!(
            "NWS zone is not set (missing {}); refer to the documentation to resolve this error",
            missing.join(", ")
        ))
    })?;

    let alert_cap = alert_cap
        .parse::<NonZeroUsize>()
        .map_err(|_| invalid(keys::NWS_ALERT_CAP, &alert_cap, "a positive integer"))?;

    let mut feed = FeedConfig::new(zone_id);
    if let Some(base) = env.get(keys::NWS_API_BASE) {
        feed.api_base = base;
    }
    if let Some(user_agent) = env.get(keys::NWS_USER_AGENT) {
        feed.user_agent = user_agent;
    }

    let mut scanner = ScannerConfig::new(alert_cap);
    if let Some(secs) = env.get(keys::NWS_POLL_INTERVAL_SECS) {
        let parsed = secs
            .parse::<u64>()
            .ok()
            .filter(|s| *s > 0)
            .ok_or_else(|| invalid(keys::NWS_POLL_INTERVAL_SECS, &secs, "a positive integer"))?;
        scanner.poll_interval = Duration::from_secs(parsed);
    }
    if let Some(path) = env.get(keys::NWS_STATE_FILE) {
        scanner.state_file = PathBuf::from(path);
    }
    if let Some(policy) = env.get(keys::NWS_ON_INVALID_FEED) {
        scanner.on_invalid_feed = policy
            .parse::<FeedInvalidPolicy>()
            .map_err(|_| invalid(keys::NWS_ON_INVALID_FEED, &policy, "`terminate` or `retry`"))?;
    }

    let channels = ChannelsConfig {
        facebook: resolve_facebook(&env),
        twitter: resolve_twitter(&env)?,
        email: resolve_email(&env)?,
    };

    let log_dir = env
        .get(keys::LOG_DIR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));

    Ok(AppConfig {
        feed,
        scanner,
        channels,
        log_dir,
    })
}

fn resolve_facebook<F>(env: &Env<'_, F>) -> ChannelSetting<FacebookConfig>
where
    F: Fn(&str) -> Option<String>,
{
    match env.group(FACEBOOK_GROUP) {
        Ok([access_token, page_id]) => ChannelSetting::Enabled(FacebookConfig {
            access_token,
            page_id,
            graph_api_base: DEFAULT_GRAPH_API_BASE.to_string(),
        }),
        Err(missing) => ChannelSetting::Disabled { missing },
    }
}

fn resolve_twitter<F>(env: &Env<'_, F>) -> Result<ChannelSetting<TwitterConfig>>
where
    F: Fn(&str) -> Option<String>,
{
    let [consumer_key, consumer_secret, access_token, access_secret] =
        match env.group(TWITTER_GROUP) {
            Ok(values) => values,
            Err(missing) => return Ok(ChannelSetting::Disabled { missing }),
        };

    let counties = env
        .get(keys::TW_COUNTIES)
        .map(|raw| {
            serde_json::from_str::<Vec<String>>(&raw)
                .map_err(|_| invalid(keys::TW_COUNTIES, &raw, "a JSON array of county names"))
        })
        .transpose()?;

    Ok(ChannelSetting::Enabled(TwitterConfig {
        consumer_key,
        consumer_secret,
        access_token,
        access_secret,
        counties,
        tweets_url: DEFAULT_TWEETS_URL.to_string(),
    }))
}

fn resolve_email<F>(env: &Env<'_, F>) -> Result<ChannelSetting<EmailConfig>>
where
    F: Fn(&str) -> Option<String>,
{
    let [server, port, from, to, secure, password] = match env.group(EMAIL_GROUP) {
        Ok(values) => values,
        Err(missing) => return Ok(ChannelSetting::Disabled { missing }),
    };

    let smtp_port = port
        .parse::<u16>()
        .map_err(|_| invalid(keys::EM_PORT, &port, "a TCP port number"))?;
    let require_tls = parse_flag(&secure)
        .ok_or_else(|| invalid(keys::EM_SECURE, &secure, "a boolean (true/false)"))?;
    let to_addresses = split_recipients(&to);
    if to_addresses.is_empty() {
        return Err(invalid(keys::EM_TO, &to, "at least one address"));
    }
    let (smtp_username, username_defaulted) = match env.get(keys::EM_USERNAME) {
        Some(username) => (username, false),
        None => (from.clone(), true),
    };

    Ok(ChannelSetting::Enabled(EmailConfig {
        smtp_host: server,
        smtp_port,
        smtp_username,
        username_defaulted,
        smtp_password: password,
        require_tls,
        from_address: from,
        to_addresses,
    }))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn invalid(key: &str, value: &str, expected: &str) -> Error {
    Error::config(format!("{key}={value:?} is invalid; expected {expected}"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn resolve_map(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    const FEED: &[(&str, &str)] = &[(keys::NWS_ZONE_ID, "WAZ558"), (keys::NWS_ALERT_CAP, "50")];

    fn with_feed(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        FEED.iter().chain(extra.iter()).copied().collect()
    }

    #[test]
    fn feed_only_uses_defaults() {
        let config = resolve_map(FEED).unwrap();
        assert_eq!(config.feed.zone_id, "WAZ558");
        assert_eq!(config.scanner.alert_cap.get(), 50);
        assert_eq!(config.scanner.poll_interval, Duration::from_secs(10));
        assert_eq!(config.scanner.state_file, PathBuf::from("alerts.txt"));
        assert_eq!(config.scanner.on_invalid_feed, FeedInvalidPolicy::Retry);
        assert_eq!(config.log_dir, PathBuf::from(DEFAULT_LOG_DIR));
        assert!(!config.channels.any_enabled());
    }

    #[test]
    fn missing_zone_is_configuration_error() {
        let err = resolve_map(&[(keys::NWS_ALERT_CAP, "5")]).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains(keys::NWS_ZONE_ID));

        let err = resolve_map(&[]).unwrap_err();
        assert!(err.to_string().contains(keys::NWS_ALERT_CAP));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let err = resolve_map(&[(keys::NWS_ZONE_ID, "  "), (keys::NWS_ALERT_CAP, "5")]).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn zero_cap_is_rejected() {
        let err = resolve_map(&[(keys::NWS_ZONE_ID, "WAZ558"), (keys::NWS_ALERT_CAP, "0")])
            .unwrap_err();
        assert!(err.to_string().contains(keys::NWS_ALERT_CAP));
    }

    #[test]
    fn scanner_overrides() {
        let config = resolve_map(&with_feed(&[
            (keys::NWS_POLL_INTERVAL_SECS, "30"),
            (keys::NWS_STATE_FILE, "/var/lib/nws/alerts.txt"),
            (keys::NWS_ON_INVALID_FEED, "Terminate"),
            (keys::NWS_API_BASE, "http://localhost:8080"),
        ]))
        .unwrap();
        assert_eq!(config.scanner.poll_interval, Duration::from_secs(30));
        assert_eq!(config.scanner.state_file, PathBuf::from("/var/lib/nws/alerts.txt"));
        assert_eq!(config.scanner.on_invalid_feed, FeedInvalidPolicy::Terminate);
        assert_eq!(config.feed.api_base, "http://localhost:8080");
    }

    #[test]
    fn facebook_group() {
        let config = resolve_map(&with_feed(&[
            (keys::FB_ACCESS_TOKEN, "token"),
            (keys::FB_PAGE_ID, "page"),
        ]))
        .unwrap();
        let fb = config.channels.facebook.as_enabled().unwrap();
        assert_eq!(fb.page_id, "page");

        let config = resolve_map(&with_feed(&[(keys::FB_ACCESS_TOKEN, "token")])).unwrap();
        match config.channels.facebook {
            ChannelSetting::Disabled { missing } => assert_eq!(missing, vec![keys::FB_PAGE_ID]),
            ChannelSetting::Enabled(_) => panic!("facebook should be disabled"),
        }
    }

    #[test]
    fn twitter_group_with_counties() {
        let config = resolve_map(&with_feed(&[
            (keys::TW_CONSUMER_KEY, "ck"),
            (keys::TW_CONSUMER_SECRET, "cs"),
            (keys::TW_ACCESS_TOKEN, "at"),
            (keys::TW_ACCESS_SECRET, "as"),
            (keys::TW_COUNTIES, r#"["Bay", "King"]"#),
        ]))
        .unwrap();
        let tw = config.channels.twitter.as_enabled().unwrap();
        assert_eq!(
            tw.counties.as_deref(),
            Some(&["Bay".to_string(), "King".to_string()][..])
        );
    }

    #[test]
    fn malformed_counties_is_rejected() {
        let err = resolve_map(&with_feed(&[
            (keys::TW_CONSUMER_KEY, "ck"),
            (keys::TW_CONSUMER_SECRET, "cs"),
            (keys::TW_ACCESS_TOKEN, "at"),
            (keys::TW_ACCESS_SECRET, "as"),
            (keys::TW_COUNTIES, "Bay, King"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(keys::TW_COUNTIES));
    }

    #[test]
    fn email_group_defaults_username_to_sender() {
        let config = resolve_map(&with_feed(&[
            (keys::EM_SERVER, "smtp.example.com"),
            (keys::EM_PORT, "587"),
            (keys::EM_FROM, "alerts@example.com"),
            (keys::EM_TO, "a@example.com, b@example.com"),
            (keys::EM_SECURE, "True"),
            (keys::EM_PASS, "secret"),
        ]))
        .unwrap();
        let em = config.channels.email.as_enabled().unwrap();
        assert_eq!(em.smtp_port, 587);
        assert!(em.require_tls);
        assert_eq!(em.smtp_username, "alerts@example.com");
        assert!(em.username_defaulted);
        assert_eq!(em.to_addresses, vec!["a@example.com", "b@example.com"]);
    }

    #[test]
    fn explicit_username_matching_sender_is_not_defaulted() {
        let config = resolve_map(&with_feed(&[
            (keys::EM_SERVER, "smtp.example.com"),
            (keys::EM_PORT, "587"),
            (keys::EM_FROM, "alerts@example.com"),
            (keys::EM_TO, "a@example.com"),
            (keys::EM_SECURE, "false"),
            (keys::EM_PASS, "secret"),
            (keys::EM_USERNAME, "alerts@example.com"),
        ]))
        .unwrap();
        let em = config.channels.email.as_enabled().unwrap();
        assert_eq!(em.smtp_username, "alerts@example.com");
        assert!(!em.username_defaulted);
    }

    #[test]
    fn email_bad_port_is_rejected() {
        let err = resolve_map(&with_feed(&[
            (keys::EM_SERVER, "smtp.example.com"),
            (keys::EM_PORT, "smtp"),
            (keys::EM_FROM, "alerts@example.com"),
            (keys::EM_TO, "a@example.com"),
            (keys::EM_SECURE, "false"),
            (keys::EM_PASS, "secret"),
            (keys::EM_USERNAME, "relay-user"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(keys::EM_PORT));
    }

    #[test]
    fn parse_flag_values() {
        assert_eq!(parse_flag("YES"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
