//! In-memory record store: the single source of truth for committed
//! records, backing every port that reads or writes them
//! (`wm_mutation_interceptor::ports::{ChecksumStore, RecordSource}`,
//! `wm_hash_tree::ports::ChecksumSource`, `wm_sync_engine::ports::EntityStore`).
//!
//! Grounded on the teacher's `qc-16-api-gateway::domain::pending`
//! `DashMap`-backed store: one table per concern, no locking beyond what
//! `DashMap` already gives each entry.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use wm_hash_tree::ports::{ChecksumSource, ChecksumSourceError};
use wm_mutation_interceptor::ports::{
    ChecksumStore, ChecksumStoreError, RecordSource, RecordSourceError,
};
use wm_shared_types::{ChecksumRow, EntityKey, EntityType};
use wm_sync_engine::ports::{EntityStore, EntityStoreError};
use wm_sync_engine::SyncRecord;

/// A composite entity's structural parent, read from its own payload by
/// convention: `{"parent_entity_type": "...", "parent_entity_id": "..."}`.
/// Absent on leaf entities.
fn parent_from_payload(payload: &Value) -> Option<EntityKey> {
    let parent_type = payload.get("parent_entity_type")?.as_str()?;
    let parent_id = payload.get("parent_entity_id")?.as_str()?;
    let entity_type = serde_json::from_value(Value::String(parent_type.to_string())).ok()?;
    Some(EntityKey::new(entity_type, parent_id.to_string()))
}

/// Holds committed records, their checksum rows, and the derived
/// parent/children structure the mutation interceptor needs to recompute
/// composite-entity ancestors.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: DashMap<EntityKey, SyncRecord>,
    checksums: DashMap<EntityKey, ChecksumRow>,
    children: DashMap<EntityKey, Vec<EntityKey>>,
}

impl InMemoryRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Commits a record, maintaining the derived child index used by
    /// `RecordSource::children_of`. Returns the key so the caller can feed
    /// it straight to `InterceptorService::on_commit`.
    pub fn commit(&self, record: SyncRecord) -> EntityKey {
        let key = record.key.clone();
        if let Some(parent) = parent_from_payload(&record.payload) {
            let mut entry = self.children.entry(parent).or_default();
            if !entry.contains(&key) {
                entry.push(key.clone());
            }
        }
        self.records.insert(key.clone(), record);
        key
    }
}

#[async_trait]
impl ChecksumStore for InMemoryRecordStore {
    async fn get(&self, key: &EntityKey) -> Result<Option<ChecksumRow>, ChecksumStoreError> {
        Ok(self.checksums.get(key).map(|r| r.clone()))
    }

    async fn upsert(&self, row: ChecksumRow) -> Result<(), ChecksumStoreError> {
        self.checksums.insert(row.key(), row);
        Ok(())
    }
}

#[async_trait]
impl RecordSource for InMemoryRecordStore {
    async fn read_record(&self, key: &EntityKey) -> Result<Option<Value>, RecordSourceError> {
        Ok(self.records.get(key).map(|r| r.payload.clone()))
    }

    async fn parent_of(&self, key: &EntityKey) -> Result<Option<EntityKey>, RecordSourceError> {
        Ok(self
            .records
            .get(key)
            .and_then(|r| parent_from_payload(&r.payload)))
    }

    async fn children_of(&self, key: &EntityKey) -> Result<Vec<EntityKey>, RecordSourceError> {
        Ok(self
            .children
            .get(key)
            .map(|entry| entry.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl ChecksumSource for InMemoryRecordStore {
    async fn rows_for(
        &self,
        entity_type: EntityType,
    ) -> Result<Vec<ChecksumRow>, ChecksumSourceError> {
        Ok(self
            .checksums
            .iter()
            .filter(|entry| entry.key().entity_type == entity_type)
            .map(|entry| entry.value().clone())
            .collect())
    }
}

#[async_trait]
impl EntityStore for InMemoryRecordStore {
    async fn get(&self, key: &EntityKey) -> Result<Option<SyncRecord>, EntityStoreError> {
        Ok(self.records.get(key).map(|r| r.clone()))
    }

    async fn upsert(&self, record: SyncRecord) -> Result<(), EntityStoreError> {
        self.commit(record);
        Ok(())
    }

    async fn local_origin_records(
        &self,
        entity_type: EntityType,
        keys: &[EntityKey],
    ) -> Result<Vec<SyncRecord>, EntityStoreError> {
        Ok(keys
            .iter()
            .filter(|k| k.entity_type == entity_type)
            .filter_map(|k| self.records.get(k).map(|r| r.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wm_shared_types::{Source, VectorClock};

    fn record(entity_type: EntityType, id: &str, payload: Value) -> SyncRecord {
        SyncRecord {
            key: EntityKey::new(entity_type, id.to_string()),
            payload,
            vector_clock: VectorClock::new(),
            source: Source::LocalServer,
            deleted: false,
            last_updated: Utc::now(),
        }
    }

    #[tokio::test]
    async fn commit_then_read_round_trips() {
        let store = InMemoryRecordStore::new();
        let rec = record(EntityType::Products, "w-1", serde_json::json!({"sku": "w-1"}));
        let key = rec.key.clone();
        store.commit(rec);

        let read = RecordSource::read_record(&store, &key).await.unwrap();
        assert_eq!(read.unwrap()["sku"], "w-1");
    }

    #[tokio::test]
    async fn children_of_indexes_by_declared_parent() {
        let store = InMemoryRecordStore::new();
        let parent_key = EntityKey::new(EntityType::Locations, "loc-1");
        let child = record(
            EntityType::Quants,
            "q-1",
            serde_json::json!({
                "parent_entity_type": "locations",
                "parent_entity_id": "loc-1",
            }),
        );
        let child_key = child.key.clone();
        store.commit(child);

        let children = RecordSource::children_of(&store, &parent_key).await.unwrap();
        assert_eq!(children, vec![child_key]);
    }

    #[tokio::test]
    async fn checksum_source_filters_by_entity_type() {
        let store = InMemoryRecordStore::new();
        let row = ChecksumRow {
            entity_type: EntityType::Products,
            entity_id: "w-1".to_string(),
            content_hash: "h".to_string(),
            children_hash: String::new(),
            full_hash: "h".to_string(),
            child_count: 0,
            last_updated: Utc::now(),
            source_instance: "node-a".to_string(),
        };
        ChecksumStore::upsert(&store, row).await.unwrap();

        let rows = store.rows_for(EntityType::Products).await.unwrap();
        assert_eq!(rows.len(), 1);
        let empty = store.rows_for(EntityType::Locations).await.unwrap();
        assert!(empty.is_empty());
    }
}
