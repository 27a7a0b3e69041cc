//! Driving API: seals and opens packets against a rotating key history and
//! fronts the relay mailbox with the event/metric side effects a deposit
//! triggers.

use std::sync::Arc;
use std::time::Duration;

use wm_shared_bus::{EventPublisher, MeshEvent};
use wm_shared_crypto::SecretKey;
use wm_shared_types::{EncryptedPacket, EntityId, EntityType, VectorClock};
use wm_telemetry::RELAY_MAILBOX_SIZE;

use crate::adapters::DEFAULT_RETENTION;
use crate::domain::{packet, CryptoError, KeyHistory};
use crate::ports::{RelayError, RelayStore};

/// Wraps a peer's own key history and, when it plays the blind-relay role,
/// its mailbox. A node that is only ever a peer can construct one of these
/// without a real relay store behind it and simply never call the
/// relay-facing methods.
pub struct SecurityLayer<R, B> {
    keys: parking_lot::RwLock<KeyHistory>,
    relay: Arc<R>,
    event_bus: Arc<B>,
    retention: Duration,
}

impl<R, B> SecurityLayer<R, B>
where
    R: RelayStore,
    B: EventPublisher,
{
    #[must_use]
    pub fn new(
        initial_key_id: impl Into<String>,
        initial_key: SecretKey,
        relay: Arc<R>,
        event_bus: Arc<B>,
    ) -> Self {
        Self {
            keys: parking_lot::RwLock::new(KeyHistory::new(initial_key_id, initial_key)),
            relay,
            event_bus,
            retention: DEFAULT_RETENTION,
        }
    }

    /// Overrides the default seven-day relay retention.
    #[must_use]
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Seals a payload under the current key, producing a packet a relay
    /// can carry without ever decrypting.
    ///
    /// # Errors
    ///
    /// Propagates [`CryptoError`] from the underlying AEAD call.
    pub fn seal(
        &self,
        entity_type: EntityType,
        entity_id: EntityId,
        version: u64,
        source_instance: String,
        vector_clock: VectorClock,
        payload: &[u8],
    ) -> Result<EncryptedPacket, CryptoError> {
        let keys = self.keys.read();
        let current = keys.current();
        packet::seal(
            entity_type,
            entity_id,
            version,
            source_instance,
            vector_clock,
            current.key_id.clone(),
            &current.key,
            payload,
        )
    }

    /// Opens `packet`, trying the key named by its `key_id` first and then
    /// falling back through the rest of the history most-recent-first, so
    /// a packet sealed just before a rotation still opens.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyExhausted`] if no retained key opens it.
    pub fn open(&self, incoming: &EncryptedPacket) -> Result<Vec<u8>, CryptoError> {
        let keys = self.keys.read();

        if let Some(key) = keys.find(&incoming.header.key_id) {
            if let Ok(plaintext) = packet::open(incoming, key) {
                return Ok(plaintext);
            }
        }

        for entry in keys.iter_most_recent_first() {
            if entry.key_id == incoming.header.key_id {
                continue;
            }
            if let Ok(plaintext) = packet::open(incoming, &entry.key) {
                return Ok(plaintext);
            }
        }

        Err(CryptoError::KeyExhausted(incoming.header.key_id.clone()))
    }

    /// Provisions a new current key, retaining the previous ones for
    /// trial decryption of in-flight packets.
    pub fn rotate_key(&self, key_id: impl Into<String>, key: SecretKey) {
        self.keys.write().rotate(key_id, key);
    }

    /// Deposits an already-sealed packet into the relay mailbox, updating
    /// the mailbox-size gauge and publishing `MeshEvent::RelayDeposit`.
    ///
    /// # Errors
    ///
    /// Propagates [`RelayError`] from the backing store.
    pub async fn deposit_for_relay(
        &self,
        recipient_instance_id: &str,
        packet: EncryptedPacket,
    ) -> Result<(), RelayError> {
        let entity_type = packet.header.entity_type;
        self.relay.deposit(recipient_instance_id, packet).await?;

        let size = self.relay.mailbox_size().await;
        RELAY_MAILBOX_SIZE.set(size as f64);

        self.event_bus
            .publish(MeshEvent::RelayDeposit {
                recipient_instance_id: recipient_instance_id.to_string(),
                entity_type,
            })
            .await;

        Ok(())
    }

    /// Fetches everything newer than `since_version` for the caller's
    /// instance, sweeping expired deposits first so a pull never pays for
    /// entries nobody will ever collect.
    ///
    /// # Errors
    ///
    /// Propagates [`RelayError`] from the backing store.
    pub async fn pull_from_relay(
        &self,
        recipient_instance_id: &str,
        entity_type: EntityType,
        since_version: u64,
        limit: usize,
    ) -> Result<Vec<EncryptedPacket>, RelayError> {
        self.relay.sweep_expired(self.retention).await;
        self.relay
            .pull(recipient_instance_id, entity_type, since_version, limit)
            .await
    }
}
