//! nws-scanner library crate.
//!
//! Polls the National Weather Service active-alert feed for one zone and
//! announces every alert it has not seen before on the configured channels
//! (Facebook page, Twitter, email). A bounded history of seen alert IDs is
//! persisted so restarts do not re-announce old alerts.

pub mod config;
pub mod domain;
pub mod error;
pub mod feed;
pub mod logging;
pub mod notification;
pub mod panic_hook;
pub mod scanner;
pub mod store;
pub mod utils;

pub use error::{Error, Result};
