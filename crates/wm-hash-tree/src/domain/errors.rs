//! Domain error types.

use thiserror::Error;

/// Errors surfaced while building or comparing hash tree views.
#[derive(Debug, Error)]
pub enum HashTreeError {
    /// The checksum source failed to produce rows for an entity type.
    #[error("checksum source unavailable: {0}")]
    SourceUnavailable(String),
}
