//! Driven ports the host application must implement.

pub mod outbound;

pub use outbound::{ChecksumStore, ChecksumStoreError, RecordSource, RecordSourceError};
