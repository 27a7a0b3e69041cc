//! Driven port (SPI) over the checksum table. `wm-mutation-interceptor`'s
//! `ChecksumStore` owns writes; a host adapter backs both traits with the
//! same underlying table (§4.2).

use async_trait::async_trait;
use thiserror::Error;
use wm_shared_types::{ChecksumRow, EntityType};

/// Read-only view over the checksum table, scoped to one entity type at
/// a time — the tree is rebuilt on demand from these rows and never
/// persisted itself (§4.2 Invariants).
#[async_trait]
pub trait ChecksumSource: Send + Sync {
    /// Every checksum row currently tracked for `entity_type`.
    async fn rows_for(
        &self,
        entity_type: EntityType,
    ) -> Result<Vec<ChecksumRow>, ChecksumSourceError>;
}

/// Errors from the checksum source port.
#[derive(Debug, Error)]
pub enum ChecksumSourceError {
    /// The backing checksum table is unreachable or errored.
    #[error("checksum source unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

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

    fn row(entity_type: EntityType, entity_id: &str) -> ChecksumRow {
        ChecksumRow {
            entity_type,
            entity_id: entity_id.to_string(),
            content_hash: "h".to_string(),
            children_hash: String::new(),
            full_hash: "h".to_string(),
            child_count: 0,
            last_updated: Utc::now(),
            source_instance: "node-a".to_string(),
        }
    }

    #[tokio::test]
    async fn fixed_source_filters_by_entity_type() {
        let rows = vec![
            row(EntityType::Products, "w-1"),
            row(EntityType::Locations, "loc-1"),
        ];
        let source = FixedSource(rows);
        let products = source.rows_for(EntityType::Products).await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].entity_id, "w-1");
    }
}
