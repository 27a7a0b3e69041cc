//! Wire DTOs for the peer and relay HTTP surfaces (§6). `RootView` and
//! `BucketView` don't derive `Serialize`/`Deserialize` themselves since
//! `wm-hash-tree` has no reason to know about the wire format; these
//! types are the one place that conversion happens.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wm_hash_tree::{BucketView, RootView};
use wm_shared_types::{EntityKey, EntityType, Source, VectorClock};
use wm_sync_engine::SyncRecord;

#[derive(Debug, Serialize, Deserialize)]
pub struct RootViewDto {
    pub root_hash: String,
    pub buckets: BTreeMap<String, String>,
}

impl From<RootView> for RootViewDto {
    fn from(view: RootView) -> Self {
        Self {
            root_hash: view.root_hash,
            buckets: view
                .buckets
                .into_iter()
                .map(|(bucket, hash)| (bucket.to_string(), hash))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BucketViewDto {
    pub bucket_hash: String,
    pub entities: BTreeMap<String, String>,
}

impl From<BucketView> for BucketViewDto {
    fn from(view: BucketView) -> Self {
        Self {
            bucket_hash: view.bucket_hash,
            entities: view.entities,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncRecordDto {
    pub entity_type: EntityType,
    pub entity_id: String,
    pub payload: serde_json::Value,
    pub vector_clock: VectorClock,
    pub source: Source,
    pub deleted: bool,
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

impl From<SyncRecord> for SyncRecordDto {
    fn from(record: SyncRecord) -> Self {
        Self {
            entity_type: record.key.entity_type,
            entity_id: record.key.entity_id,
            payload: record.payload,
            vector_clock: record.vector_clock,
            source: record.source,
            deleted: record.deleted,
            last_updated: record.last_updated,
        }
    }
}

impl From<SyncRecordDto> for SyncRecord {
    fn from(dto: SyncRecordDto) -> Self {
        Self {
            key: EntityKey::new(dto.entity_type, dto.entity_id),
            payload: dto.payload,
            vector_clock: dto.vector_clock,
            source: dto.source,
            deleted: dto.deleted,
            last_updated: dto.last_updated,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PullRequest {
    pub entity_type: EntityType,
    pub entity_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PullResponse {
    pub records: Vec<SyncRecordDto>,
}

#[derive(Debug, Deserialize)]
pub struct PushRequest {
    pub entity_type: EntityType,
    pub records: Vec<SyncRecordDto>,
}

#[derive(Debug, Deserialize)]
pub struct RelayPullQuery {
    pub recipient_instance_id: String,
    pub entity_type: EntityType,
    #[serde(default)]
    pub since_version: u64,
    #[serde(default = "default_relay_pull_limit")]
    pub limit: usize,
}

fn default_relay_pull_limit() -> usize {
    100
}

pub(crate) fn to_entity_keys(entity_type: EntityType, ids: Vec<String>) -> Vec<EntityKey> {
    ids.into_iter()
        .map(|id| EntityKey::new(entity_type, id))
        .collect()
}
