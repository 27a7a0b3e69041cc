//! The four-step comparison algorithm (§4.2 Comparison algorithm).

pub mod diff;

pub use diff::{diff_buckets, diff_entities, EntityDiff};
