//! Driving API: fetch checksum rows through the port, then build the
//! tree views on demand (§4.2 Operations). Nothing here is cached or
//! persisted — every call re-derives the tree from current rows.

use std::sync::Arc;

use wm_shared_types::EntityType;

use crate::domain::{build_bucket, build_root, BucketView, HashTreeError, RootView};
use crate::ports::ChecksumSource;

/// Computes root and bucket views over one entity type's checksum rows.
pub struct HashTreeService<S> {
    checksum_source: Arc<S>,
}

impl<S: ChecksumSource> HashTreeService<S> {
    /// Build a service over the given checksum source port.
    pub fn new(checksum_source: Arc<S>) -> Self {
        Self { checksum_source }
    }

    /// `root(entity_type)` — the bucketed root hash and per-bucket hashes.
    pub async fn root(&self, entity_type: EntityType) -> Result<RootView, HashTreeError> {
        let rows = self
            .checksum_source
            .rows_for(entity_type)
            .await
            .map_err(|e| HashTreeError::SourceUnavailable(e.to_string()))?;
        Ok(build_root(&rows))
    }

    /// `bucket(entity_type, bucket)` — the leaf view for one bucket key.
    ///
    /// Rows outside the requested bucket are filtered out before the
    /// bucket hash is computed, so `build_bucket` only ever sees rows
    /// belonging to `bucket`.
    pub async fn bucket(
        &self,
        entity_type: EntityType,
        bucket: char,
    ) -> Result<BucketView, HashTreeError> {
        let rows = self
            .checksum_source
            .rows_for(entity_type)
            .await
            .map_err(|e| HashTreeError::SourceUnavailable(e.to_string()))?;
        let scoped: Vec<_> = rows
            .into_iter()
            .filter(|r| crate::domain::bucket_key(entity_type, &r.entity_id) == bucket)
            .collect();
        Ok(build_bucket(&scoped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use wm_shared_types::ChecksumRow;

    use crate::ports::ChecksumSourceError;

    struct FixedSource(Vec<ChecksumRow>);

    #[async_trait]
    impl ChecksumSource for FixedSource {
        async fn rows_for(
            &self,
            entity_type: EntityType,
        ) -> Result<Vec<ChecksumRow>, ChecksumSourceError> {
            Ok(self
                .0
                .iter()
                .filter(|r| r.entity_type == entity_type)
                .cloned()
                .collect())
        }
    }

    fn row(entity_id: &str, full_hash: &str) -> ChecksumRow {
        ChecksumRow {
            entity_type: EntityType::Products,
            entity_id: entity_id.to_string(),
            content_hash: full_hash.to_string(),
            children_hash: String::new(),
            full_hash: full_hash.to_string(),
            child_count: 0,
            last_updated: Utc::now(),
            source_instance: "node-a".to_string(),
        }
    }

    #[tokio::test]
    async fn root_covers_all_buckets() {
        let rows = vec![row("w-1", "h1"), row("a-1", "h2")];
        let service = HashTreeService::new(Arc::new(FixedSource(rows)));
        let root = service.root(EntityType::Products).await.unwrap();
        assert_eq!(root.buckets.len(), 2);
    }

    #[tokio::test]
    async fn bucket_scopes_to_requested_key() {
        let rows = vec![row("w-1", "h1"), row("w-2", "h2"), row("a-1", "h3")];
        let service = HashTreeService::new(Arc::new(FixedSource(rows)));
        let bucket = service.bucket(EntityType::Products, 'w').await.unwrap();
        assert_eq!(bucket.entities.len(), 2);
        assert!(bucket.entities.contains_key("w-1"));
        assert!(bucket.entities.contains_key("w-2"));
    }

    #[tokio::test]
    async fn empty_table_yields_empty_root() {
        let service = HashTreeService::new(Arc::new(FixedSource(vec![])));
        let root = service.root(EntityType::Products).await.unwrap();
        assert!(root.buckets.is_empty());
        assert_eq!(root.root_hash, "");
    }
}
