//! On-demand bucketed hash tree over the checksum table, plus the pure
//! comparison algorithm used to find out what a peer is missing.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Give the sync engine two things without ever touching the network
//! itself:
//! - A two-level bucketed hash tree (root → bucket → entity) built fresh
//!   from the checksum table on every call, never persisted.
//! - A pure diff algorithm over two already-fetched tree views that says
//!   which buckets differ and, within a differing bucket, which entity
//!   ids need to move in which direction.
//!
//! ## Module Structure
//!
//! ```text
//! wm-hash-tree/
//! ├── domain/       # bucketing, leaf/bucket/root hash construction, errors
//! ├── algorithms/   # diff_buckets / diff_entities comparison math
//! ├── ports/        # ChecksumSource (read-only SPI over the checksum table)
//! └── service/      # HashTreeService driving API: root()/bucket()
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod domain;
pub mod ports;
pub mod service;

pub use algorithms::{diff_buckets, diff_entities, EntityDiff};
pub use domain::{
    bucket_key, bucket_key_for, build_bucket, build_root, bucket_hash, leaf_view, root_hash,
    BucketView, HashTreeError, LeafView, RootView,
};
pub use ports::{ChecksumSource, ChecksumSourceError};
pub use service::HashTreeService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
