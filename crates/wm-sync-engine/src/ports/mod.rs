//! Driven ports the sync engine needs from its host.

pub mod outbound;

pub use outbound::{
    ConflictResolver, EntityStore, EntityStoreError, LocalTree, MeshTransport, PeerRoster,
    Resolution, SyncMetadataEntry, SyncMetadataSink, SyncStatus, TransportError,
};
