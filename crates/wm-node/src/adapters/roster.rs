//! The peer roster: built once at handshake time per peer and read on
//! every sync/health cycle thereafter (§9 Singleton discipline — "readers
//! are hot, writers are rare").

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use wm_shared_types::PeerAdvertisement;
use wm_sync_engine::ports::PeerRoster;

struct PeerEntry {
    advertisement: PeerAdvertisement,
    reachable: bool,
}

#[derive(Default)]
pub struct Roster {
    peers: RwLock<HashMap<String, PeerEntry>>,
}

impl Roster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record or refresh a peer's self-description from `/mesh/handshake`.
    /// A reconnecting peer is marked reachable again.
    pub fn upsert(&self, advertisement: PeerAdvertisement) {
        self.peers.write().insert(
            advertisement.instance_id.clone(),
            PeerEntry {
                advertisement,
                reachable: true,
            },
        );
    }

    /// Every peer this node has ever handshaken with, reachable or not —
    /// the full listing for `/mesh/nodes`.
    #[must_use]
    pub fn all_peers(&self) -> Vec<PeerAdvertisement> {
        self.peers
            .read()
            .values()
            .map(|entry| entry.advertisement.clone())
            .collect()
    }
}

#[async_trait]
impl PeerRoster for Roster {
    async fn known_peers(&self) -> Vec<PeerAdvertisement> {
        self.peers
            .read()
            .values()
            .filter(|entry| entry.reachable)
            .map(|entry| entry.advertisement.clone())
            .collect()
    }

    async fn mark_unreachable(&self, peer_instance_id: &str) {
        if let Some(entry) = self.peers.write().get_mut(peer_instance_id) {
            entry.reachable = false;
        }
    }
}
