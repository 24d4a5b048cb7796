//! Durable state owned by the dispatch loop.

mod seen_ids;

pub use seen_ids::SeenIdStore;
