//! The driving API: `on_commit`.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, warn};
use wm_shared_bus::{EventPublisher, MeshEvent};
use wm_shared_types::{ChecksumRow, EntityKey};

use crate::domain::{canonicalize, children_hash, content_hash, full_hash};
use crate::errors::InterceptorError;
use crate::ports::{ChecksumStore, RecordSource};

/// Maximum ancestor hops walked per commit. Guards against a misconfigured
/// parent relation forming an unbounded chain even when it isn't a literal
/// cycle; the visited-set check below catches true cycles earlier.
const MAX_ANCESTOR_DEPTH: usize = 64;

/// Computes canonical content hashes for committed mutations and keeps the
/// checksum side table — including composite-entity ancestors — in sync
/// with them (§4.1).
pub struct InterceptorService<C, R, B> {
    checksum_store: Arc<C>,
    record_source: Arc<R>,
    event_bus: Arc<B>,
    instance_id: String,
}

impl<C, R, B> InterceptorService<C, R, B>
where
    C: ChecksumStore,
    R: RecordSource,
    B: EventPublisher,
{
    pub fn new(
        checksum_store: Arc<C>,
        record_source: Arc<R>,
        event_bus: Arc<B>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            checksum_store,
            record_source,
            event_bus,
            instance_id: instance_id.into(),
        }
    }

    /// Handle a locally committed insert/update/soft-delete.
    ///
    /// Canonicalization failure does not fail the commit (§4.1 Failure):
    /// the checksum row is left unchanged and the error is logged, so the
    /// next successful mutation on this record repairs it.
    pub async fn on_commit(&self, key: EntityKey) -> Result<(), InterceptorError> {
        let Some(record) = self.record_source.read_record(&key).await? else {
            warn!(
                entity_type = ?key.entity_type,
                entity_id = %key.entity_id,
                "on_commit called for a record no longer readable"
            );
            return Ok(());
        };

        let canonical = match canonicalize(key.entity_type, &record) {
            Ok(canonical) => canonical,
            Err(e) => {
                error!(
                    entity_type = ?key.entity_type,
                    entity_id = %key.entity_id,
                    error = %e,
                    "canonicalization failed, checksum row left unchanged"
                );
                return Ok(());
            }
        };

        let hash = content_hash(&canonical);
        let existing_children_hash = self
            .checksum_store
            .get(&key)
            .await?
            .map(|row| row.children_hash)
            .unwrap_or_default();

        let children = self.record_source.children_of(&key).await?;
        let row = ChecksumRow {
            entity_type: key.entity_type,
            entity_id: key.entity_id.clone(),
            content_hash: hash.clone(),
            children_hash: existing_children_hash.clone(),
            full_hash: full_hash(&hash, &existing_children_hash),
            child_count: children.len() as u64,
            last_updated: Utc::now(),
            source_instance: self.instance_id.clone(),
        };

        self.checksum_store.upsert(row.clone()).await?;
        self.event_bus
            .publish(MeshEvent::MutationIndexed { key: key.clone(), row })
            .await;

        self.recompute_ancestors(&key).await?;
        Ok(())
    }

    /// Bottom-up ancestor recompute with a visited-set cycle guard (§9).
    async fn recompute_ancestors(&self, changed: &EntityKey) -> Result<(), InterceptorError> {
        let mut visited = HashSet::new();
        visited.insert(changed.clone());
        let mut current = changed.clone();

        for _ in 0..MAX_ANCESTOR_DEPTH {
            let Some(parent) = self.record_source.parent_of(&current).await? else {
                break;
            };
            if !visited.insert(parent.clone()) {
                warn!(
                    entity_type = ?parent.entity_type,
                    entity_id = %parent.entity_id,
                    "cycle detected in parent relation, aborting ancestor recompute"
                );
                break;
            }

            let children = self.record_source.children_of(&parent).await?;
            let mut child_hashes = Vec::with_capacity(children.len());
            for child in &children {
                if let Some(row) = self.checksum_store.get(child).await? {
                    // §3 Invariant: `full_hash` is a function of the current
                    // `full_hash` of every child, not just its own content —
                    // otherwise a grandchild's change never reaches the
                    // grandparent's `full_hash`.
                    child_hashes.push((row.entity_id, row.full_hash));
                }
            }

            let new_children_hash = children_hash(&child_hashes);
            let parent_content_hash = self
                .checksum_store
                .get(&parent)
                .await?
                .map(|row| row.content_hash)
                .unwrap_or_default();

            let row = ChecksumRow {
                entity_type: parent.entity_type,
                entity_id: parent.entity_id.clone(),
                content_hash: parent_content_hash.clone(),
                children_hash: new_children_hash.clone(),
                full_hash: full_hash(&parent_content_hash, &new_children_hash),
                child_count: children.len() as u64,
                last_updated: Utc::now(),
                source_instance: self.instance_id.clone(),
            };
            self.checksum_store.upsert(row).await?;
            debug!(
                entity_type = ?parent.entity_type,
                entity_id = %parent.entity_id,
                "recomputed ancestor children_hash"
            );

            current = parent;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::RwLock;
    use wm_shared_bus::InMemoryEventBus;
    use wm_shared_types::EntityType;

    use crate::ports::{ChecksumStoreError, RecordSourceError};

    #[derive(Default)]
    struct FakeChecksumStore {
        rows: RwLock<HashMap<EntityKey, ChecksumRow>>,
    }

    #[async_trait]
    impl ChecksumStore for FakeChecksumStore {
        async fn get(&self, key: &EntityKey) -> Result<Option<ChecksumRow>, ChecksumStoreError> {
            Ok(self.rows.read().unwrap().get(key).cloned())
        }

        async fn upsert(&self, row: ChecksumRow) -> Result<(), ChecksumStoreError> {
            self.rows.write().unwrap().insert(row.key(), row);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeRecordSource {
        records: HashMap<EntityKey, serde_json::Value>,
        parents: HashMap<EntityKey, EntityKey>,
        children: HashMap<EntityKey, Vec<EntityKey>>,
    }

    #[async_trait]
    impl RecordSource for FakeRecordSource {
        async fn read_record(
            &self,
            key: &EntityKey,
        ) -> Result<Option<serde_json::Value>, RecordSourceError> {
            Ok(self.records.get(key).cloned())
        }

        async fn parent_of(&self, key: &EntityKey) -> Result<Option<EntityKey>, RecordSourceError> {
            Ok(self.parents.get(key).cloned())
        }

        async fn children_of(&self, key: &EntityKey) -> Result<Vec<EntityKey>, RecordSourceError> {
            Ok(self.children.get(key).cloned().unwrap_or_default())
        }
    }

    fn service(
        records: FakeRecordSource,
    ) -> InterceptorService<FakeChecksumStore, FakeRecordSource, InMemoryEventBus> {
        InterceptorService::new(
            Arc::new(FakeChecksumStore::default()),
            Arc::new(records),
            Arc::new(InMemoryEventBus::new()),
            "node-a",
        )
    }

    #[tokio::test]
    async fn on_commit_upserts_a_leaf_row() {
        let key = EntityKey::new(EntityType::Products, "W-1");
        let mut source = FakeRecordSource::default();
        source
            .records
            .insert(key.clone(), json!({ "sku": "W-1", "quantity": 4 }));

        let service = service(source);
        service.on_commit(key.clone()).await.unwrap();

        let row = service.checksum_store.get(&key).await.unwrap().unwrap();
        assert_eq!(row.full_hash, row.content_hash);
        assert!(row.children_hash.is_empty());
    }

    #[tokio::test]
    async fn on_commit_skips_missing_record_without_error() {
        let key = EntityKey::new(EntityType::Products, "ghost");
        let service = service(FakeRecordSource::default());
        service.on_commit(key.clone()).await.unwrap();
        assert!(service.checksum_store.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn on_commit_leaves_row_unchanged_on_canonicalization_failure() {
        let key = EntityKey::new(EntityType::Products, "W-1");
        let mut source = FakeRecordSource::default();
        source.records.insert(key.clone(), json!(["not", "an", "object"]));

        let service = service(source);
        service.on_commit(key.clone()).await.unwrap();
        assert!(service.checksum_store.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn on_commit_recomputes_parent_children_hash() {
        let child = EntityKey::new(EntityType::Quants, "q-1");
        let parent = EntityKey::new(EntityType::Locations, "loc-1");

        let mut source = FakeRecordSource::default();
        source
            .records
            .insert(child.clone(), json!({ "on_hand": 3 }));
        source
            .records
            .insert(parent.clone(), json!({ "name": "Bay 1" }));
        source.parents.insert(child.clone(), parent.clone());
        source.children.insert(parent.clone(), vec![child.clone()]);

        let service = service(source);
        service.on_commit(child).await.unwrap();

        let parent_row = service.checksum_store.get(&parent).await.unwrap().unwrap();
        assert!(!parent_row.children_hash.is_empty());
        assert_ne!(parent_row.full_hash, parent_row.content_hash);
    }

    #[tokio::test]
    async fn grandparent_children_hash_folds_child_full_hash_not_content_hash() {
        let grandchild = EntityKey::new(EntityType::Quants, "q-1");
        let child = EntityKey::new(EntityType::Packages, "pkg-1");
        let grandparent = EntityKey::new(EntityType::Locations, "loc-1");

        let mut source = FakeRecordSource::default();
        source.records.insert(grandchild.clone(), json!({ "on_hand": 3 }));
        source.records.insert(child.clone(), json!({ "label": "pallet" }));
        source.records.insert(grandparent.clone(), json!({ "name": "Bay 1" }));
        source.parents.insert(grandchild.clone(), child.clone());
        source.parents.insert(child.clone(), grandparent.clone());
        source.children.insert(child.clone(), vec![grandchild.clone()]);
        source.children.insert(grandparent.clone(), vec![child.clone()]);

        let service = service(source);
        // Commit bottom-up so `child`'s own row already folds in
        // `grandchild` before `grandparent`'s ancestor recompute runs.
        service.on_commit(grandchild).await.unwrap();
        service.on_commit(child.clone()).await.unwrap();

        let child_row = service.checksum_store.get(&child).await.unwrap().unwrap();
        let grandparent_row = service.checksum_store.get(&grandparent).await.unwrap().unwrap();

        // `child` has its own child, so its full_hash must diverge from its
        // bare content_hash — otherwise this test can't distinguish the two.
        assert_ne!(child_row.full_hash, child_row.content_hash);

        let expected_children_hash =
            crate::domain::children_hash(&[(child.entity_id.clone(), child_row.full_hash.clone())]);
        assert_eq!(
            grandparent_row.children_hash, expected_children_hash,
            "grandparent's children_hash must fold the child's full_hash, not its content_hash"
        );
    }

    #[tokio::test]
    async fn ancestor_recompute_stops_on_cycle() {
        let a = EntityKey::new(EntityType::Locations, "a");
        let b = EntityKey::new(EntityType::Locations, "b");

        let mut source = FakeRecordSource::default();
        source.records.insert(a.clone(), json!({ "name": "A" }));
        source.records.insert(b.clone(), json!({ "name": "B" }));
        // a's parent is b, b's parent is a: a genuine cycle.
        source.parents.insert(a.clone(), b.clone());
        source.parents.insert(b.clone(), a.clone());
        source.children.insert(a.clone(), vec![b.clone()]);
        source.children.insert(b.clone(), vec![a.clone()]);

        let service = service(source);
        // Must terminate rather than loop forever.
        service.on_commit(a).await.unwrap();
    }
}
