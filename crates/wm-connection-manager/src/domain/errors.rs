//! Errors surfaced by the connection manager.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectionManagerError {
    #[error("peer {0} has no routes configured")]
    UnknownPeer(String),

    #[error("all routes unavailable for peer {0}")]
    PeerOffline(String),

    #[error("probe error: {0}")]
    Probe(String),
}
