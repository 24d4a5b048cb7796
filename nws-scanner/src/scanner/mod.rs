//! Alert scanner: the timer-driven fetch, de-duplicate and fan-out loop.
//!
//! # Architecture
//!
//! - A ticker task fires every `poll_interval` and posts into a one-slot
//!   mailbox; ticks that arrive while a cycle is running are coalesced.
//! - A single worker ([`AlertScanner::run`]) drains the mailbox, so cycles
//!   never overlap and the seen-ID store has exactly one mutator.
//! - A cycle that fails to fetch is abandoned and the next tick retries.
//!   A rejected query is retried the same way unless [`FeedInvalidPolicy`]
//!   says to stop.

mod service;

pub use service::{AlertScanner, CycleReport, DispatchedAlert};

use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default poll interval (10 seconds).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default seen-ID history file.
pub const DEFAULT_STATE_FILE: &str = "alerts.txt";

/// What to do when the feed rejects the query itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedInvalidPolicy {
    /// Log and try again on the next tick, like any other fetch failure.
    #[default]
    Retry,
    /// Stop the scanner and surface the error to the caller.
    Terminate,
}

impl FromStr for FeedInvalidPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "terminate" | "exit" => Ok(Self::Terminate),
            "retry" => Ok(Self::Retry),
            other => Err(format!("unknown invalid-feed policy: {other}")),
        }
    }
}

impl fmt::Display for FeedInvalidPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminate => f.write_str("terminate"),
            Self::Retry => f.write_str("retry"),
        }
    }
}

/// Scanner configuration.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Time between the starts of consecutive cycles.
    pub poll_interval: Duration,
    /// Maximum number of alert IDs remembered.
    pub alert_cap: NonZeroUsize,
    /// File the seen-ID history is persisted to.
    pub state_file: PathBuf,
    pub on_invalid_feed: FeedInvalidPolicy,
}

impl ScannerConfig {
    pub fn new(alert_cap: NonZeroUsize) -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            alert_cap,
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            on_invalid_feed: FeedInvalidPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parse() {
        assert_eq!("Terminate".parse(), Ok(FeedInvalidPolicy::Terminate));
        assert_eq!(" retry ".parse(), Ok(FeedInvalidPolicy::Retry));
        assert!("ignore".parse::<FeedInvalidPolicy>().is_err());
    }

    #[test]
    fn test_default_policy_keeps_polling() {
        assert_eq!(FeedInvalidPolicy::default(), FeedInvalidPolicy::Retry);
        let config = ScannerConfig::new(NonZeroUsize::new(3).unwrap());
        assert_eq!(config.on_invalid_feed, FeedInvalidPolicy::Retry);
    }

    #[test]
    fn test_policy_display_round_trips() {
        for policy in [FeedInvalidPolicy::Terminate, FeedInvalidPolicy::Retry] {
            assert_eq!(policy.to_string().parse(), Ok(policy));
        }
    }
}
