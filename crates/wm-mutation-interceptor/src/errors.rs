//! Error types for canonicalization and interception.

use thiserror::Error;

use crate::ports::outbound::{ChecksumStoreError, RecordSourceError};

/// Failures from the canonicalization contract (§4.1 steps 1-5).
#[derive(Debug, Error)]
pub enum CanonicalizationError {
    /// The record did not serialize to a JSON object.
    #[error("record is not a JSON object")]
    NotAnObject,

    /// A field held a value that cannot be rendered to the canonical form
    /// (nested array/object, or a float with no decimal representation).
    #[error("field '{0}' cannot be canonicalized")]
    UnrepresentableValue(String),
}

/// Failures from the interceptor's driving API.
#[derive(Debug, Error)]
pub enum InterceptorError {
    /// Propagated from the checksum store port.
    #[error(transparent)]
    ChecksumStore(#[from] ChecksumStoreError),

    /// Propagated from the record source port.
    #[error(transparent)]
    RecordSource(#[from] RecordSourceError),
}
