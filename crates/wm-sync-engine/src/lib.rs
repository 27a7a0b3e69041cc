//! Orchestrates reconciliation between this node and each known peer:
//! `Idle -> Running -> Busy` state machine, bounded priority queue, and the
//! six-step peer loop over the hash tree's comparison output.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Module Structure
//!
//! ```text
//! wm-sync-engine/
//! ├── domain/   # state machine, bounded queue, apply-decision types, errors
//! ├── ports/    # MeshTransport, PeerRoster, EntityStore, ConflictResolver,
//! │             # LocalTree, SyncMetadataSink
//! └── service/  # SyncEngine driving API
//! ```

#![warn(missing_docs)]
#![allow(missing_docs)]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{
    ApplyOutcome, BoundedSyncQueue, EngineState, SyncEngineError, SyncRecord, ENTITY_SYNC_ORDER,
};
pub use ports::{
    ConflictResolver, EntityStore, EntityStoreError, LocalTree, MeshTransport, PeerRoster,
    Resolution, SyncMetadataEntry, SyncMetadataSink, SyncStatus, TransportError,
};
pub use service::SyncEngine;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
