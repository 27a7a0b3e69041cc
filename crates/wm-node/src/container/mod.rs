//! Phased construction of every service this node runs, modeled on the
//! teacher's `SubsystemContainer::new`: build shared infrastructure first,
//! then each service in dependency order, logging as each comes up.

use std::sync::Arc;

use wm_conflict_resolver::ConflictResolverService;
use wm_connection_manager::adapters::{ReqwestRouteProbe, SystemTimeSource};
use wm_connection_manager::ConnectionManager;
use wm_hash_tree::HashTreeService;
use wm_mutation_interceptor::InterceptorService;
use wm_security_layer::SecurityLayer;
use wm_security_layer::adapters::InMemoryRelayMailbox;
use wm_shared_bus::InMemoryEventBus;
use wm_shared_crypto::SecretKey;
use wm_sync_engine::SyncEngine;
use tracing::info;

use crate::adapters::{
    HashTreeLocalTree, InMemoryManualQueue, InMemoryMetadataSink, InMemoryRecordStore,
    ReqwestMeshTransport, Roster,
};
use crate::config::NodeConfig;

pub type Store = InMemoryRecordStore;
pub type EventBus = InMemoryEventBus;
pub type Resolver = ConflictResolverService<InMemoryManualQueue, EventBus>;
pub type Transport = ReqwestMeshTransport<ReqwestRouteProbe, SystemTimeSource, EventBus>;
pub type Engine = SyncEngine<HashTreeLocalTree<Store>, Transport, Roster, Store, Resolver, InMemoryMetadataSink, EventBus>;
pub type Connections = ConnectionManager<ReqwestRouteProbe, SystemTimeSource, EventBus>;
pub type Security = SecurityLayer<InMemoryRelayMailbox, EventBus>;
pub type Interceptor = InterceptorService<Store, Store, EventBus>;

/// Every service a running node holds, wired together once at startup.
pub struct NodeContainer {
    pub config: NodeConfig,
    pub event_bus: Arc<EventBus>,
    pub store: Arc<Store>,
    pub roster: Arc<Roster>,
    pub connections: Arc<Connections>,
    pub engine: Arc<Engine>,
    pub resolver: Arc<Resolver>,
    pub security: Arc<Security>,
    pub interceptor: Arc<Interceptor>,
    pub metadata: Arc<InMemoryMetadataSink>,
}

impl NodeContainer {
    /// Phase 1: shared infra (event bus, record store). Phase 2: the
    /// connection manager. Phase 3: the security layer. Phase 4: the
    /// sync engine, wired over every port adapter built in the prior
    /// phases. Phase 5: the mutation interceptor, last, since every
    /// record commit from here on should flow through it.
    #[must_use]
    pub fn new(config: NodeConfig) -> Self {
        info!(instance_id = %config.network.instance_id, "phase 1: shared infrastructure");
        let event_bus = Arc::new(InMemoryEventBus::new());
        let store = Arc::new(InMemoryRecordStore::new());
        let roster = Arc::new(Roster::new());
        let metadata = Arc::new(InMemoryMetadataSink::new());

        info!("phase 2: connection manager");
        let probe = Arc::new(ReqwestRouteProbe::new(config.sync.route_idle_connection_cap));
        let clock = Arc::new(SystemTimeSource::new());
        let connections = Arc::new(ConnectionManager::new(probe, clock, event_bus.clone()));

        info!("phase 3: security layer");
        let relay = Arc::new(InMemoryRelayMailbox::new());
        let security = Arc::new(SecurityLayer::new(
            config.security.initial_key_id.clone(),
            SecretKey::from_bytes(config.security.initial_key),
            relay,
            event_bus.clone(),
        ));

        info!("phase 4: sync engine");
        let roster_for_transport = roster.clone();
        let resolve_base_url = Arc::new(move |peer_instance_id: &str| {
            roster_for_transport
                .all_peers()
                .into_iter()
                .find(|p| p.instance_id == peer_instance_id)
                .map(|p| p.base_url)
        });
        let transport = Arc::new(ReqwestMeshTransport::new(
            config.sync.route_idle_connection_cap,
            connections.clone(),
            resolve_base_url,
            config.network.instance_id.clone(),
            config.network.role,
            config.security.mesh_secret.to_vec(),
            config.sync.transport_retry_base,
            config.sync.transport_max_retries,
        ));
        let local_tree = Arc::new(HashTreeLocalTree::new(HashTreeService::new(store.clone())));
        let manual_queue = Arc::new(InMemoryManualQueue::new());
        let resolver = Arc::new(ConflictResolverService::new(
            manual_queue,
            event_bus.clone(),
            config.resolver.simultaneity_window,
        ));
        let engine = Arc::new(SyncEngine::new(
            config.network.instance_id.clone(),
            local_tree,
            transport,
            roster.clone(),
            store.clone(),
            resolver.clone(),
            metadata.clone(),
            event_bus.clone(),
            config.sync.queue_capacity,
        ));

        info!("phase 5: mutation interceptor");
        let interceptor = Arc::new(InterceptorService::new(
            store.clone(),
            store.clone(),
            event_bus.clone(),
            config.network.instance_id.clone(),
        ));

        Self {
            config,
            event_bus,
            store,
            roster,
            connections,
            engine,
            resolver,
            security,
            interceptor,
            metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_builds_from_default_config() {
        let container = NodeContainer::new(NodeConfig::default());
        assert_eq!(container.engine.sync_status(), wm_sync_engine::EngineState::Idle);
    }
}
