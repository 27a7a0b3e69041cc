//! In-memory `SyncMetadataSink`: the last-N recorded rows per peer/entity
//! type pair, exposed to the admin surface for diagnostics.

use async_trait::async_trait;
use dashmap::DashMap;
use wm_sync_engine::ports::{SyncMetadataEntry, SyncMetadataSink};

/// Rows retained per `(peer_instance_id, entity_type)` key before the
/// oldest is dropped.
const MAX_ROWS_PER_KEY: usize = 50;

#[derive(Default)]
pub struct InMemoryMetadataSink {
    rows: DashMap<(String, wm_shared_types::EntityType), Vec<SyncMetadataEntry>>,
}

impl InMemoryMetadataSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn recent_for(
        &self,
        peer_instance_id: &str,
        entity_type: wm_shared_types::EntityType,
    ) -> Vec<SyncMetadataEntry> {
        self.rows
            .get(&(peer_instance_id.to_string(), entity_type))
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SyncMetadataSink for InMemoryMetadataSink {
    async fn record(&self, entry: SyncMetadataEntry) {
        let key = (entry.peer_instance_id.clone(), entry.entity_type);
        let mut rows = self.rows.entry(key).or_default();
        rows.push(entry);
        if rows.len() > MAX_ROWS_PER_KEY {
            rows.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wm_shared_types::EntityType;
    use wm_sync_engine::ports::SyncStatus;

    fn entry() -> SyncMetadataEntry {
        SyncMetadataEntry {
            peer_instance_id: "node-b".to_string(),
            entity_type: EntityType::Products,
            recorded_at: Utc::now(),
            status: SyncStatus::Applied,
            pulled: 2,
            pushed: 0,
        }
    }

    #[tokio::test]
    async fn records_are_retrievable_by_key() {
        let sink = InMemoryMetadataSink::new();
        sink.record(entry()).await;
        let rows = sink.recent_for("node-b", EntityType::Products);
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn caps_at_max_rows_per_key() {
        let sink = InMemoryMetadataSink::new();
        for _ in 0..(MAX_ROWS_PER_KEY + 5) {
            sink.record(entry()).await;
        }
        assert_eq!(sink.recent_for("node-b", EntityType::Products).len(), MAX_ROWS_PER_KEY);
    }
}
