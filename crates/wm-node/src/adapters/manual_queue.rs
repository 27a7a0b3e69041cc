//! In-memory `ManualQueue`: holds conflicts the resolver's ladder
//! couldn't settle automatically, for an operator surface to drain.

use async_trait::async_trait;
use parking_lot::RwLock;
use wm_conflict_resolver::ports::{ManualQueue, ManualQueueError, ManualReviewEntry};

#[derive(Default)]
pub struct InMemoryManualQueue {
    entries: RwLock<Vec<ManualReviewEntry>>,
}

impl InMemoryManualQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn pending(&self) -> Vec<ManualReviewEntry> {
        self.entries.read().clone()
    }
}

#[async_trait]
impl ManualQueue for InMemoryManualQueue {
    async fn enqueue(&self, entry: ManualReviewEntry) -> Result<(), ManualQueueError> {
        self.entries.write().push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wm_shared_types::{EntityKey, EntityType};

    #[tokio::test]
    async fn enqueue_is_retained_in_order() {
        let queue = InMemoryManualQueue::new();
        queue
            .enqueue(ManualReviewEntry {
                key: EntityKey::new(EntityType::Products, "w-1"),
                reason: "tied".to_string(),
                queued_at: Utc::now(),
            })
            .await
            .unwrap();
        assert_eq!(queue.pending().len(), 1);
    }
}
