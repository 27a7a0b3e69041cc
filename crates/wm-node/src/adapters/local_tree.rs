//! Adapts `wm_hash_tree::HashTreeService` to `wm_sync_engine`'s `LocalTree`
//! port, the seam the engine's six-step peer loop reads this node's own
//! tree through (§4.3 step 1).

use async_trait::async_trait;
use wm_hash_tree::ports::ChecksumSource;
use wm_hash_tree::{BucketView, HashTreeService, RootView};
use wm_shared_types::EntityType;
use wm_sync_engine::ports::{LocalTree, TransportError};

pub struct HashTreeLocalTree<S> {
    service: HashTreeService<S>,
}

impl<S> HashTreeLocalTree<S> {
    #[must_use]
    pub fn new(service: HashTreeService<S>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S> LocalTree for HashTreeLocalTree<S>
where
    S: ChecksumSource,
{
    async fn local_root(&self, entity_type: EntityType) -> Result<RootView, TransportError> {
        self.service
            .root(entity_type)
            .await
            .map_err(|e| TransportError::Malformed(e.to_string()))
    }

    async fn local_bucket(
        &self,
        entity_type: EntityType,
        bucket: char,
    ) -> Result<BucketView, TransportError> {
        self.service
            .bucket(entity_type, bucket)
            .await
            .map_err(|e| TransportError::Malformed(e.to_string()))
    }
}
