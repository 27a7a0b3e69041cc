//! Driven port for the blind relay's mailbox, so `wm-node`'s relay role can
//! back it with a persisted store while the rest of this crate stays
//! storage-agnostic.

use async_trait::async_trait;
use wm_shared_types::{EncryptedPacket, EntityType};

/// A blind relay's replicated mailbox: stores opaque packets keyed by the
/// recipient they were deposited for, and serves them back by a version
/// watermark. Never decrypts, validates or resolves conflicts — that's the
/// receiving peer's job.
#[async_trait]
pub trait RelayStore: Send + Sync {
    /// Stores `packet` for later pickup by `recipient_instance_id`.
    /// Implementations upsert by `(entity_type, entity_id)`, keeping only
    /// the highest `version` seen for a given key.
    async fn deposit(
        &self,
        recipient_instance_id: &str,
        packet: EncryptedPacket,
    ) -> Result<(), RelayError>;

    /// Packets deposited for `recipient_instance_id` of `entity_type` whose
    /// header version is strictly greater than `since_version`, capped at
    /// `limit` entries and ordered oldest-version-first.
    async fn pull(
        &self,
        recipient_instance_id: &str,
        entity_type: EntityType,
        since_version: u64,
        limit: usize,
    ) -> Result<Vec<EncryptedPacket>, RelayError>;

    /// Drops everything older than `retention`, returning the count removed.
    async fn sweep_expired(&self, retention: std::time::Duration) -> usize;

    /// Total packets currently held across every recipient, for the
    /// `wm_security_layer_relay_mailbox_size` gauge.
    async fn mailbox_size(&self) -> usize;
}

/// Errors surfaced by a [`RelayStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("relay store unavailable: {0}")]
    Unavailable(String),
}
