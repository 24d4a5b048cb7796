//! Domain types shared by the feed, the channels and the dispatch loop.

pub mod alert;

pub use alert::AlertRecord;
