//! Driving API: the `Idle -> Running -> Busy` state machine and the
//! six-step peer loop (§4.3).

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use wm_hash_tree::{diff_buckets, diff_entities};
use wm_shared_bus::{EventPublisher, MeshEvent};
use wm_shared_types::EntityType;
use wm_telemetry::{
    time_histogram, SYNC_ENTITIES_PULLED, SYNC_ENTITIES_PUSHED, SYNC_PASSES_FAILED,
    SYNC_PASSES_STARTED, SYNC_PASS_DURATION,
};

use crate::domain::{BoundedSyncQueue, EngineState, SyncEngineError, ENTITY_SYNC_ORDER};
use crate::ports::{
    ConflictResolver, EntityStore, LocalTree, MeshTransport, PeerRoster, SyncMetadataEntry,
    SyncMetadataSink, SyncStatus, TransportError,
};

/// Orchestrates reconciliation between this node and each known peer.
///
/// Generic over its six driven ports so the host wires in whichever
/// transport, store and resolver adapters fit its deployment, matching the
/// rest of this workspace's port-generic driving services.
pub struct SyncEngine<L, T, R, E, C, M, B> {
    instance_id: String,
    local_tree: Arc<L>,
    transport: Arc<T>,
    roster: Arc<R>,
    entity_store: Arc<E>,
    conflict_resolver: Arc<C>,
    metadata_sink: Arc<M>,
    event_bus: Arc<B>,
    state: RwLock<EngineState>,
    queue: AsyncMutex<BoundedSyncQueue>,
    cancellation: CancellationToken,
}

impl<L, T, R, E, C, M, B> SyncEngine<L, T, R, E, C, M, B>
where
    L: LocalTree,
    T: MeshTransport,
    R: PeerRoster,
    E: EntityStore,
    C: ConflictResolver,
    M: SyncMetadataSink,
    B: EventPublisher,
{
    pub fn new(
        instance_id: impl Into<String>,
        local_tree: Arc<L>,
        transport: Arc<T>,
        roster: Arc<R>,
        entity_store: Arc<E>,
        conflict_resolver: Arc<C>,
        metadata_sink: Arc<M>,
        event_bus: Arc<B>,
        queue_capacity: usize,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            local_tree,
            transport,
            roster,
            entity_store,
            conflict_resolver,
            metadata_sink,
            event_bus,
            state: RwLock::new(EngineState::Idle),
            queue: AsyncMutex::new(BoundedSyncQueue::new(queue_capacity)),
            cancellation: CancellationToken::new(),
        }
    }

    /// Current coarse run state.
    #[must_use]
    pub fn sync_status(&self) -> EngineState {
        *self.state.read()
    }

    /// Every peer currently known to this node.
    pub async fn known_peers(&self) -> Vec<wm_shared_types::PeerAdvertisement> {
        self.roster.known_peers().await
    }

    /// Enqueue a reconciliation request. `Idle` transitions to `Running`;
    /// a request arriving while already `Running` or `Busy` moves the state
    /// to `Busy` and the request waits in the bounded priority queue.
    pub async fn request_sync(&self, peer_instance_id: impl Into<String>, priority: u8) {
        let peer_instance_id = peer_instance_id.into();
        let mut queue = self.queue.lock().await;
        if let Some(dropped) = queue.push(peer_instance_id.clone(), priority) {
            warn!(
                dropped_peer = %dropped.peer_instance_id,
                "sync queue overflowed, dropped lowest-priority oldest entry"
            );
        }

        let mut state = self.state.write();
        *state = match *state {
            EngineState::Idle => EngineState::Running,
            EngineState::Running | EngineState::Busy => EngineState::Busy,
        };
    }

    /// Drain the queue, running one peer cycle per request in priority
    /// order, until empty or cancelled. Returns to `Idle` once drained.
    pub async fn drain(&self) {
        loop {
            if self.cancellation.is_cancelled() {
                break;
            }
            let next = {
                let mut queue = self.queue.lock().await;
                queue.pop()
            };
            let Some(request) = next else { break };

            {
                let mut state = self.state.write();
                *state = EngineState::Running;
            }

            if let Err(error) = self.run_peer_cycle(&request.peer_instance_id).await {
                warn!(peer_instance_id = %request.peer_instance_id, %error, "sync pass failed");
            }
        }

        let mut state = self.state.write();
        *state = EngineState::Idle;
    }

    /// Stop any in-flight or queued work. Cancellation is cooperative: the
    /// token is checked between entity types within `run_peer_cycle`. Once
    /// cancelled the token cannot be un-cancelled — a process that needs to
    /// restart reconciliation builds a fresh `SyncEngine`.
    pub fn stop(&self) {
        self.cancellation.cancel();
        *self.state.write() = EngineState::Idle;
    }

    /// Run the six-step peer loop against one peer, for every entity type
    /// in prerequisite-first order (§4.3).
    pub async fn run_peer_cycle(&self, peer_instance_id: &str) -> Result<(), SyncEngineError> {
        SYNC_PASSES_STARTED.inc();
        let _timer = time_histogram!(SYNC_PASS_DURATION);
        self.event_bus
            .publish(MeshEvent::SyncStarted {
                peer_instance_id: peer_instance_id.to_string(),
            })
            .await;

        let mut total_pulled = 0u64;
        let mut total_pushed = 0u64;

        for entity_type in ENTITY_SYNC_ORDER {
            if self.cancellation.is_cancelled() {
                info!(peer_instance_id, "sync cycle cancelled mid-pass");
                break;
            }

            match self.sync_entity_type(peer_instance_id, entity_type).await {
                Ok((pulled, pushed)) => {
                    total_pulled += pulled;
                    total_pushed += pushed;
                }
                Err(error) => {
                    SYNC_PASSES_FAILED
                        .with_label_values(&[entity_type.as_wire_str()])
                        .inc();
                    self.event_bus
                        .publish(MeshEvent::SyncFailed {
                            peer_instance_id: peer_instance_id.to_string(),
                            reason: error.to_string(),
                        })
                        .await;
                    return Err(error);
                }
            }
        }

        SYNC_ENTITIES_PULLED.inc_by(total_pulled as f64);
        SYNC_ENTITIES_PUSHED.inc_by(total_pushed as f64);
        self.event_bus
            .publish(MeshEvent::SyncCompleted {
                peer_instance_id: peer_instance_id.to_string(),
                entities_pulled: total_pulled,
                entities_pushed: total_pushed,
            })
            .await;

        Ok(())
    }

    /// Steps 1-6 for one entity type: compare roots, expand differing
    /// buckets, pull, push, record metadata. Returns `(pulled, pushed)`.
    async fn sync_entity_type(
        &self,
        peer_instance_id: &str,
        entity_type: EntityType,
    ) -> Result<(u64, u64), SyncEngineError> {
        let transport_err = |e: TransportError| SyncEngineError::Transport {
            peer_instance_id: peer_instance_id.to_string(),
            source: Box::new(e),
        };

        // Step 1: build local root, fetch peer's root.
        let local_root = self
            .local_tree
            .local_root(entity_type)
            .await
            .map_err(transport_err)?;
        let remote_root = self
            .transport
            .fetch_root(peer_instance_id, entity_type)
            .await
            .map_err(transport_err)?;

        // Step 2: compare; equal roots mean this entity type is up to date.
        if local_root.root_hash == remote_root.root_hash {
            self.metadata_sink
                .record(SyncMetadataEntry {
                    peer_instance_id: peer_instance_id.to_string(),
                    entity_type,
                    recorded_at: chrono::Utc::now(),
                    status: SyncStatus::UpToDate,
                    pulled: 0,
                    pushed: 0,
                })
                .await;
            return Ok((0, 0));
        }

        // Step 3: expand differing buckets into the entity-level diff.
        let differing_buckets = diff_buckets(&local_root, &remote_root);
        let mut pulled = 0u64;
        let mut pushed = 0u64;

        for bucket in differing_buckets {
            let local_bucket = self
                .local_tree
                .local_bucket(entity_type, bucket)
                .await
                .map_err(transport_err)?;
            let remote_bucket = self
                .transport
                .fetch_bucket(peer_instance_id, entity_type, bucket)
                .await
                .map_err(transport_err)?;
            let diff = diff_entities(entity_type, &local_bucket, &remote_bucket);

            // Step 4: pull.
            if !diff.need_from_peer.is_empty() {
                let records = self
                    .transport
                    .pull(peer_instance_id, entity_type, &diff.need_from_peer)
                    .await
                    .map_err(transport_err)?;
                pulled += records.len() as u64;
                for record in records {
                    if let Err(reason) = self.apply_record(record).await {
                        warn!(peer_instance_id, ?entity_type, %reason, "skipped record, continuing payload");
                    }
                }
            }

            // Step 5: push.
            if !diff.need_to_peer.is_empty() {
                let records = self
                    .entity_store
                    .local_origin_records(entity_type, &diff.need_to_peer)
                    .await
                    .map_err(|e| SyncEngineError::EntityStore(e.to_string()))?;
                pushed += records.len() as u64;
                self.transport
                    .push(peer_instance_id, entity_type, records)
                    .await
                    .map_err(transport_err)?;
            }
        }

        // Step 6: record sync metadata.
        self.metadata_sink
            .record(SyncMetadataEntry {
                peer_instance_id: peer_instance_id.to_string(),
                entity_type,
                recorded_at: chrono::Utc::now(),
                status: SyncStatus::Applied,
                pulled,
                pushed,
            })
            .await;

        Ok((pulled, pushed))
    }

    /// Apply rules for one incoming record (§4.3 Apply rules): insert when
    /// no local counterpart exists, otherwise defer to the conflict
    /// resolver. A failure here is the caller's to skip-and-log, not to
    /// abort the rest of the payload.
    async fn apply_record(&self, record: crate::domain::SyncRecord) -> Result<(), String> {
        let existing = self
            .entity_store
            .get(&record.key)
            .await
            .map_err(|e| e.to_string())?;

        match existing {
            None => self
                .entity_store
                .upsert(record)
                .await
                .map_err(|e| e.to_string()),
            Some(existing) => {
                let resolution = self.conflict_resolver.resolve(&existing, &record).await;
                if resolution.winner_is_incoming {
                    self.entity_store
                        .upsert(record)
                        .await
                        .map_err(|e| e.to_string())
                } else {
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use wm_hash_tree::{BucketView, RootView};
    use wm_shared_bus::InMemoryEventBus;
    use wm_shared_types::{EntityKey, PeerAdvertisement, Source, VectorClock};

    use crate::domain::SyncRecord;
    use crate::ports::{EntityStoreError, Resolution};

    struct FixedTree(RootView, HashMap<char, BucketView>);

    #[async_trait]
    impl LocalTree for FixedTree {
        async fn local_root(&self, _entity_type: EntityType) -> Result<RootView, TransportError> {
            Ok(self.0.clone())
        }
        async fn local_bucket(
            &self,
            _entity_type: EntityType,
            bucket: char,
        ) -> Result<BucketView, TransportError> {
            self.1
                .get(&bucket)
                .cloned()
                .ok_or_else(|| TransportError::Malformed("no such bucket".into()))
        }
    }

    struct FixedTransport {
        root: RootView,
        buckets: HashMap<char, BucketView>,
        pull_records: Vec<SyncRecord>,
    }

    #[async_trait]
    impl MeshTransport for FixedTransport {
        async fn fetch_root(
            &self,
            _peer: &str,
            _entity_type: EntityType,
        ) -> Result<RootView, TransportError> {
            Ok(self.root.clone())
        }
        async fn fetch_bucket(
            &self,
            _peer: &str,
            _entity_type: EntityType,
            bucket: char,
        ) -> Result<BucketView, TransportError> {
            self.buckets
                .get(&bucket)
                .cloned()
                .ok_or_else(|| TransportError::Malformed("no such bucket".into()))
        }
        async fn pull(
            &self,
            _peer: &str,
            _entity_type: EntityType,
            _ids: &[EntityKey],
        ) -> Result<Vec<SyncRecord>, TransportError> {
            Ok(self.pull_records.clone())
        }
        async fn push(
            &self,
            _peer: &str,
            _entity_type: EntityType,
            _records: Vec<SyncRecord>,
        ) -> Result<(), TransportError> {
            Ok(())
        }
    }

    struct FixedRoster(Vec<PeerAdvertisement>);

    #[async_trait]
    impl PeerRoster for FixedRoster {
        async fn known_peers(&self) -> Vec<PeerAdvertisement> {
            self.0.clone()
        }
        async fn mark_unreachable(&self, _peer: &str) {}
    }

    struct InMemoryStore(Mutex<HashMap<EntityKey, SyncRecord>>);

    #[async_trait]
    impl EntityStore for InMemoryStore {
        async fn get(&self, key: &EntityKey) -> Result<Option<SyncRecord>, EntityStoreError> {
            Ok(self.0.lock().unwrap().get(key).cloned())
        }
        async fn upsert(&self, record: SyncRecord) -> Result<(), EntityStoreError> {
            self.0.lock().unwrap().insert(record.key.clone(), record);
            Ok(())
        }
        async fn local_origin_records(
            &self,
            _entity_type: EntityType,
            _keys: &[EntityKey],
        ) -> Result<Vec<SyncRecord>, EntityStoreError> {
            Ok(vec![])
        }
    }

    struct AlwaysIncomingWins;

    #[async_trait]
    impl ConflictResolver for AlwaysIncomingWins {
        async fn resolve(&self, _existing: &SyncRecord, _incoming: &SyncRecord) -> Resolution {
            Resolution {
                winner_is_incoming: true,
                reason: "test".into(),
            }
        }
    }

    struct NullMetadataSink;

    #[async_trait]
    impl SyncMetadataSink for NullMetadataSink {
        async fn record(&self, _entry: SyncMetadataEntry) {}
    }

    fn record(id: &str) -> SyncRecord {
        SyncRecord {
            key: EntityKey::new(EntityType::Products, id),
            payload: serde_json::json!({"name": "widget"}),
            vector_clock: VectorClock::new(),
            source: Source::Pda,
            deleted: false,
            last_updated: chrono::Utc::now(),
        }
    }

    fn test_engine(
        local_root: RootView,
        remote_root: RootView,
        pull_records: Vec<SyncRecord>,
    ) -> SyncEngine<
        FixedTree,
        FixedTransport,
        FixedRoster,
        InMemoryStore,
        AlwaysIncomingWins,
        NullMetadataSink,
        InMemoryEventBus,
    > {
        SyncEngine::new(
            "node-a",
            Arc::new(FixedTree(local_root, HashMap::new())),
            Arc::new(FixedTransport {
                root: remote_root,
                buckets: HashMap::new(),
                pull_records,
            }),
            Arc::new(FixedRoster(vec![])),
            Arc::new(InMemoryStore(Mutex::new(HashMap::new()))),
            Arc::new(AlwaysIncomingWins),
            Arc::new(NullMetadataSink),
            Arc::new(InMemoryEventBus::new()),
            16,
        )
    }

    fn empty_root() -> RootView {
        RootView {
            root_hash: String::new(),
            buckets: Default::default(),
        }
    }

    #[tokio::test]
    async fn matching_roots_skip_the_entity_type() {
        let engine = test_engine(empty_root(), empty_root(), vec![]);
        let result = engine.run_peer_cycle("peer-b").await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn request_sync_moves_idle_to_running() {
        let engine = test_engine(empty_root(), empty_root(), vec![]);
        assert_eq!(engine.sync_status(), EngineState::Idle);
        engine.request_sync("peer-b", 5).await;
        assert_eq!(engine.sync_status(), EngineState::Running);
    }

    #[tokio::test]
    async fn second_request_while_running_moves_to_busy() {
        let engine = test_engine(empty_root(), empty_root(), vec![]);
        engine.request_sync("peer-b", 5).await;
        engine.request_sync("peer-c", 5).await;
        assert_eq!(engine.sync_status(), EngineState::Busy);
    }

    #[tokio::test]
    async fn pulled_record_with_no_local_counterpart_is_inserted() {
        let pulled = vec![record("w-1")];
        let differing_root = RootView {
            root_hash: "r1".into(),
            buckets: [('w', "b1".to_string())].into_iter().collect(),
        };
        let other_root = RootView {
            root_hash: "r2".into(),
            buckets: [('w', "b2".to_string())].into_iter().collect(),
        };

        let mut buckets = HashMap::new();
        buckets.insert(
            'w',
            BucketView {
                bucket_hash: "b1".into(),
                entities: Default::default(),
            },
        );

        let engine = SyncEngine::new(
            "node-a",
            Arc::new(FixedTree(differing_root, buckets.clone())),
            Arc::new(FixedTransport {
                root: other_root,
                buckets: {
                    let mut m = HashMap::new();
                    m.insert(
                        'w',
                        BucketView {
                            bucket_hash: "b2".into(),
                            entities: [("w-1".to_string(), "h1".to_string())]
                                .into_iter()
                                .collect(),
                        },
                    );
                    m
                },
                pull_records: pulled,
            }),
            Arc::new(FixedRoster(vec![])),
            Arc::new(InMemoryStore(Mutex::new(HashMap::new()))),
            Arc::new(AlwaysIncomingWins),
            Arc::new(NullMetadataSink),
            Arc::new(InMemoryEventBus::new()),
            16,
        );

        engine.run_peer_cycle("peer-b").await.unwrap();
        let stored = engine
            .entity_store
            .get(&EntityKey::new(EntityType::Products, "w-1"))
            .await
            .unwrap();
        assert!(stored.is_some());
    }
}
