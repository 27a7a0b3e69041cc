//! Driven ports (SPI) the sync engine needs from its host: a transport to
//! the mesh, a roster of known peers, the local entity store, a conflict
//! resolver, and a sink for per-cycle sync metadata (§4.3).

use async_trait::async_trait;
use thiserror::Error;
use wm_hash_tree::{BucketView, RootView};
use wm_shared_types::{EntityKey, EntityType, PeerAdvertisement};

use crate::domain::SyncRecord;

/// Network round trips against one peer's mesh HTTP surface (§6).
#[async_trait]
pub trait MeshTransport: Send + Sync {
    async fn fetch_root(
        &self,
        peer_instance_id: &str,
        entity_type: EntityType,
    ) -> Result<RootView, TransportError>;

    async fn fetch_bucket(
        &self,
        peer_instance_id: &str,
        entity_type: EntityType,
        bucket: char,
    ) -> Result<BucketView, TransportError>;

    /// `POST /mesh/pull` — request records for the given ids.
    async fn pull(
        &self,
        peer_instance_id: &str,
        entity_type: EntityType,
        entity_ids: &[EntityKey],
    ) -> Result<Vec<SyncRecord>, TransportError>;

    /// `POST /mesh/push` — send records the peer is missing.
    async fn push(
        &self,
        peer_instance_id: &str,
        entity_type: EntityType,
        records: Vec<SyncRecord>,
    ) -> Result<(), TransportError>;
}

/// Errors from a mesh transport round trip.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("peer unreachable: {0}")]
    Unreachable(String),
    #[error("peer returned a malformed response: {0}")]
    Malformed(String),
}

/// This node's own hash tree (§4.2), wrapped by the host so the engine
/// doesn't need a direct `ChecksumSource` generic of its own.
#[async_trait]
pub trait LocalTree: Send + Sync {
    async fn local_root(&self, entity_type: EntityType) -> Result<RootView, TransportError>;

    async fn local_bucket(
        &self,
        entity_type: EntityType,
        bucket: char,
    ) -> Result<BucketView, TransportError>;
}

/// The set of peers this node knows about, and the health transitions the
/// sync engine triggers on persistent failure (§4.3 Failure semantics).
#[async_trait]
pub trait PeerRoster: Send + Sync {
    async fn known_peers(&self) -> Vec<PeerAdvertisement>;

    /// Mark a peer offline after persistent unreachability. The next
    /// successful handshake (outside this crate's concern) reinstates it.
    async fn mark_unreachable(&self, peer_instance_id: &str);
}

/// The local entity store: read/write the domain records the sync engine
/// applies and the ones it offers to peers.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get(&self, key: &EntityKey) -> Result<Option<SyncRecord>, EntityStoreError>;

    /// Upsert one record inside the caller's transaction. Per §4.3 Apply
    /// rules, the mutation interceptor's normal path refreshes the checksum
    /// after commit — this port only owns the record itself.
    async fn upsert(&self, record: SyncRecord) -> Result<(), EntityStoreError>;

    /// Records local-origin and due for push to the given peer (role-scoped
    /// by the caller per §4.3 Role behavior).
    async fn local_origin_records(
        &self,
        entity_type: EntityType,
        keys: &[EntityKey],
    ) -> Result<Vec<SyncRecord>, EntityStoreError>;
}

/// Errors from the entity store port.
#[derive(Debug, Error)]
pub enum EntityStoreError {
    #[error("entity store unavailable: {0}")]
    Unavailable(String),
}

/// A conflict resolution outcome the decision ladder (§4.5) hands back;
/// the sync engine only needs to know which side won.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub winner_is_incoming: bool,
    pub reason: String,
}

/// Driven port over the (separately owned) conflict resolver.
#[async_trait]
pub trait ConflictResolver: Send + Sync {
    async fn resolve(&self, existing: &SyncRecord, incoming: &SyncRecord) -> Resolution;
}

/// Per-cycle sync metadata sink (§4.3 step 6): peer id, entity type, time,
/// status, counts.
#[async_trait]
pub trait SyncMetadataSink: Send + Sync {
    async fn record(&self, entry: SyncMetadataEntry);
}

/// One row of recorded sync metadata.
#[derive(Debug, Clone)]
pub struct SyncMetadataEntry {
    pub peer_instance_id: String,
    pub entity_type: EntityType,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
    pub status: SyncStatus,
    pub pulled: u64,
    pub pushed: u64,
}

/// The outcome of one entity type's exchange within a peer cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    UpToDate,
    Applied,
    Failed,
}
