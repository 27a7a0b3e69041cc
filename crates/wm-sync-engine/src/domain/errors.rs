//! Errors surfaced by the sync engine's domain and service layers.

use thiserror::Error;

/// Errors from one sync pass against a peer.
#[derive(Debug, Error)]
pub enum SyncEngineError {
    #[error("transport error talking to peer {peer_instance_id}: {source}")]
    Transport {
        peer_instance_id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("peer {0} sent a malformed payload, rejecting whole payload")]
    MalformedPayload(String),

    #[error("entity store error: {0}")]
    EntityStore(String),

    #[error("peer {0} is not in the roster")]
    UnknownPeer(String),
}
