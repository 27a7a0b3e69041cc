//! Driven port over the checksum side table.

pub mod outbound;

pub use outbound::{ChecksumSource, ChecksumSourceError};
