//! In-memory [`RelayStore`]: one [`DashMap`] per recipient, each keyed by
//! `(entity_type, entity_id)`. Grounded on the teacher's gateway-side
//! `DashMap`-backed pending-request store, which keeps per-entry insertion
//! timestamps for its own timeout sweep the same way this store does for
//! its TTL sweep.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use wm_shared_types::{EncryptedPacket, EntityId, EntityType};

use crate::ports::{RelayError, RelayStore};

struct Deposited {
    packet: EncryptedPacket,
    deposited_at: DateTime<Utc>,
}

/// Default retention for a relay mailbox entry (resolves the open retention
/// question: seven days, swept on each pull).
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Process-local relay mailbox. Suitable for a single relay instance or as
/// the test double for `wm-node`'s `sqlx`-backed one.
#[derive(Default)]
pub struct InMemoryRelayMailbox {
    mailboxes: DashMap<String, DashMap<(EntityType, EntityId), Deposited>>,
}

impl InMemoryRelayMailbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RelayStore for InMemoryRelayMailbox {
    async fn deposit(
        &self,
        recipient_instance_id: &str,
        packet: EncryptedPacket,
    ) -> Result<(), RelayError> {
        let mailbox = self
            .mailboxes
            .entry(recipient_instance_id.to_string())
            .or_default();
        let key = (packet.header.entity_type, packet.header.entity_id.clone());
        let incoming_version = packet.header.version;
        let superseded = mailbox
            .get(&key)
            .is_some_and(|existing| existing.packet.header.version > incoming_version);
        if !superseded {
            mailbox.insert(
                key,
                Deposited {
                    packet,
                    deposited_at: Utc::now(),
                },
            );
        }
        Ok(())
    }

    async fn pull(
        &self,
        recipient_instance_id: &str,
        entity_type: EntityType,
        since_version: u64,
        limit: usize,
    ) -> Result<Vec<EncryptedPacket>, RelayError> {
        let Some(mailbox) = self.mailboxes.get(recipient_instance_id) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<EncryptedPacket> = mailbox
            .iter()
            .filter(|entry| {
                entry.key().0 == entity_type && entry.value().packet.header.version > since_version
            })
            .map(|entry| entry.value().packet.clone())
            .collect();
        matches.sort_by_key(|packet| packet.header.version);
        matches.truncate(limit);

        Ok(matches)
    }

    async fn sweep_expired(&self, retention: Duration) -> usize {
        let cutoff = match chrono::Duration::from_std(retention) {
            Ok(age) => Utc::now() - age,
            Err(_) => return 0,
        };

        let mut removed = 0;
        for mailbox in self.mailboxes.iter() {
            let stale: Vec<_> = mailbox
                .iter()
                .filter(|entry| entry.value().deposited_at < cutoff)
                .map(|entry| *entry.key())
                .collect();
            for key in stale {
                mailbox.remove(&key);
                removed += 1;
            }
        }
        removed
    }

    async fn mailbox_size(&self) -> usize {
        self.mailboxes.iter().map(|mailbox| mailbox.len()).sum()
    }
}
