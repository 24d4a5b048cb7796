//! Application-wide error types.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Application-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The feed could not be reached or returned a payload we could not use.
    /// The dispatch loop retries on the next tick.
    #[error("Feed fetch failed: {0}")]
    Fetch(String),

    /// The feed rejected the query itself (for example an unknown zone).
    #[error("Feed reported an invalid request: {0}")]
    FeedInvalid(String),

    #[error("{channel} delivery failed: {message}")]
    Publish {
        channel: &'static str,
        message: String,
    },

    #[error("Failed to persist seen alerts to {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error while {op} {}: {source}", path.display())]
    IoPath {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    pub fn publish(channel: &'static str, msg: impl Into<String>) -> Self {
        Self::Publish {
            channel,
            message: msg.into(),
        }
    }

    pub fn io_path(op: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self::IoPath {
            op,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether the feed rejected the query, as opposed to a transient failure.
    pub fn is_feed_invalid(&self) -> bool {
        matches!(self, Self::FeedInvalid(_))
    }
}
