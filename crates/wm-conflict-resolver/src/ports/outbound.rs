//! Driven port surfacing `manual` resolutions to a human operator (§4.5
//! step 3). A manual resolution's eventual outcome is itself a mutation
//! and goes back through the mutation interceptor — this crate only owns
//! getting it in front of a person.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use wm_shared_types::EntityKey;

#[async_trait]
pub trait ManualQueue: Send + Sync {
    async fn enqueue(&self, entry: ManualReviewEntry) -> Result<(), ManualQueueError>;
}

#[derive(Debug, Clone)]
pub struct ManualReviewEntry {
    pub key: EntityKey,
    pub reason: String,
    pub queued_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum ManualQueueError {
    #[error("manual review queue unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use wm_shared_types::EntityType;

    struct InMemoryQueue(Mutex<Vec<ManualReviewEntry>>);

    #[async_trait]
    impl ManualQueue for InMemoryQueue {
        async fn enqueue(&self, entry: ManualReviewEntry) -> Result<(), ManualQueueError> {
            self.0.lock().unwrap().push(entry);
            Ok(())
        }
    }

    #[tokio::test]
    async fn enqueue_retains_the_entry() {
        let queue = InMemoryQueue(Mutex::new(Vec::new()));
        queue
            .enqueue(ManualReviewEntry {
                key: EntityKey::new(EntityType::Products, "p-1"),
                reason: "tied".into(),
                queued_at: Utc::now(),
            })
            .await
            .unwrap();
        assert_eq!(queue.0.lock().unwrap().len(), 1);
    }
}
