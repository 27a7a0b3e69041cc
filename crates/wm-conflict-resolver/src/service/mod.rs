//! Driving API, and the adapter that lets `wm-sync-engine` consume this
//! crate's ladder through its own `ConflictResolver` port.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;
use wm_shared_bus::{EventPublisher, MeshEvent};
use wm_shared_types::EntityKey;
use wm_sync_engine::ports::{ConflictResolver as EngineConflictResolver, Resolution as EngineResolution};
use wm_sync_engine::SyncRecord;
use wm_telemetry::{CONFLICTS_AUTO_RESOLVED, CONFLICTS_QUEUED_FOR_REVIEW};

use crate::domain::{candidate::Candidate, ladder, Outcome};
use crate::ports::{ManualQueue, ManualQueueError, ManualReviewEntry};

/// Wraps the decision ladder with the event/metric side effects and the
/// manual-review escalation path, and implements `wm-sync-engine`'s
/// `ConflictResolver` port so the two crates connect without either
/// depending on the other's internals beyond that one seam.
pub struct ConflictResolverService<Q, B> {
    manual_queue: std::sync::Arc<Q>,
    event_bus: std::sync::Arc<B>,
    simultaneity_window: Duration,
}

impl<Q, B> ConflictResolverService<Q, B>
where
    Q: ManualQueue,
    B: EventPublisher,
{
    #[must_use]
    pub fn new(
        manual_queue: std::sync::Arc<Q>,
        event_bus: std::sync::Arc<B>,
        simultaneity_window: Duration,
    ) -> Self {
        Self {
            manual_queue,
            event_bus,
            simultaneity_window,
        }
    }

    /// Run the ladder for one key and apply its side effects. Returns
    /// `true` when the incoming side won (including the manual-review
    /// case, where the existing record is left untouched until a human
    /// weighs in).
    pub async fn resolve(
        &self,
        key: &EntityKey,
        existing: &Candidate,
        incoming: &Candidate,
    ) -> Result<bool, ManualQueueError> {
        match ladder::resolve_with_window(key.entity_type, existing, incoming, self.simultaneity_window) {
            Outcome::Resolved {
                strategy,
                winner_is_incoming,
                winner_instance,
                reason,
            } => {
                CONFLICTS_AUTO_RESOLVED
                    .with_label_values(&[strategy.as_str()])
                    .inc();
                info!(
                    key = ?key,
                    strategy = strategy.as_str(),
                    winner_instance,
                    "conflict resolved automatically"
                );
                self.event_bus
                    .publish(MeshEvent::ConflictResolved {
                        key: key.clone(),
                        winner_instance,
                        reason,
                    })
                    .await;
                Ok(winner_is_incoming)
            }
            Outcome::Manual { reason } => {
                CONFLICTS_QUEUED_FOR_REVIEW.inc();
                self.manual_queue
                    .enqueue(ManualReviewEntry {
                        key: key.clone(),
                        reason,
                        queued_at: Utc::now(),
                    })
                    .await?;
                self.event_bus
                    .publish(MeshEvent::ConflictQueuedForReview { key: key.clone() })
                    .await;
                Ok(false)
            }
        }
    }
}

/// `SyncRecord` carries no explicit origin-instance field, so the
/// candidate's placeholder id is only ever used as the `originating_instance`
/// fallback for a still-empty vector clock (both sides tie on it equally).
fn candidate_from_record(record: &SyncRecord) -> Candidate {
    let placeholder = Candidate {
        instance_id: String::new(),
        vector_clock: record.vector_clock.clone(),
        source: record.source,
        last_updated: record.last_updated,
    };
    let instance_id = crate::domain::originating_instance(&placeholder).to_string();
    Candidate {
        instance_id,
        ..placeholder
    }
}

#[async_trait]
impl<Q, B> EngineConflictResolver for ConflictResolverService<Q, B>
where
    Q: ManualQueue,
    B: EventPublisher,
{
    async fn resolve(&self, existing: &SyncRecord, incoming: &SyncRecord) -> EngineResolution {
        let existing_candidate = candidate_from_record(existing);
        let incoming_candidate = candidate_from_record(incoming);
        let winner_is_incoming = ConflictResolverService::resolve(
            self,
            &existing.key,
            &existing_candidate,
            &incoming_candidate,
        )
        .await
        .unwrap_or_else(|error| {
            tracing::warn!(%error, "manual queue unavailable, defaulting to local record");
            false
        });

        EngineResolution {
            winner_is_incoming,
            reason: "resolved via wm-conflict-resolver decision ladder".to_string(),
        }
    }
}
