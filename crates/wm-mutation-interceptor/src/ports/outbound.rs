//! Driven ports (SPI) the host store must implement (§4.1).

use async_trait::async_trait;
use thiserror::Error;
use wm_shared_types::{ChecksumRow, EntityKey};

/// Read/write access to the checksum side table, owned exclusively by
/// this crate (§3 Ownership & lifecycle).
#[async_trait]
pub trait ChecksumStore: Send + Sync {
    /// Fetch the current row for `key`, if one exists.
    async fn get(&self, key: &EntityKey) -> Result<Option<ChecksumRow>, ChecksumStoreError>;

    /// Insert or replace the row for `row.key()`.
    async fn upsert(&self, row: ChecksumRow) -> Result<(), ChecksumStoreError>;
}

/// Read access to committed records and the composite-entity structure
/// around them, so the interceptor can mark ancestors dirty without
/// owning entity storage itself (§4.1 upsert semantics).
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// The current committed record as a JSON object, or `None` if it no
    /// longer exists.
    async fn read_record(
        &self,
        key: &EntityKey,
    ) -> Result<Option<serde_json::Value>, RecordSourceError>;

    /// The structural parent of a composite entity, if any (e.g. a
    /// location's parent location, a shipment's parent picking).
    async fn parent_of(&self, key: &EntityKey) -> Result<Option<EntityKey>, RecordSourceError>;

    /// Every child whose `full_hash` feeds this entity's
    /// `children_hash`.
    async fn children_of(&self, key: &EntityKey) -> Result<Vec<EntityKey>, RecordSourceError>;
}

/// Errors from the checksum store port.
#[derive(Debug, Error)]
pub enum ChecksumStoreError {
    /// The store backing the checksum table is unreachable or errored.
    #[error("checksum store unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the record source port.
#[derive(Debug, Error)]
pub enum RecordSourceError {
    /// The host's record storage is unreachable or errored.
    #[error("record source unavailable: {0}")]
    Unavailable(String),
}
