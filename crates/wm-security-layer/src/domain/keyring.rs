//! Short key history for rotation (§4.6): a peer keeps its last few
//! provisioned keys and, on receipt, tries the one named by the packet's
//! `key_id` first, then falls back to the rest in most-recent-first order
//! so a packet encrypted just before a rotation still opens.

use wm_shared_crypto::SecretKey;

/// How many past keys a [`KeyHistory`] retains by default.
pub const DEFAULT_HISTORY_DEPTH: usize = 3;

/// One provisioned key and the id it's addressed by in a packet header.
pub struct KeyEntry {
    pub key_id: String,
    pub key: SecretKey,
}

/// The most-recent-first list of keys a peer or relay has been
/// provisioned with. Index 0 is always the current key used to encrypt
/// new outbound packets.
pub struct KeyHistory {
    entries: Vec<KeyEntry>,
    depth: usize,
}

impl KeyHistory {
    /// Starts a history with a single current key.
    #[must_use]
    pub fn new(initial_key_id: impl Into<String>, initial_key: SecretKey) -> Self {
        Self::with_depth(initial_key_id, initial_key, DEFAULT_HISTORY_DEPTH)
    }

    /// Starts a history retaining at most `depth` keys.
    #[must_use]
    pub fn with_depth(initial_key_id: impl Into<String>, initial_key: SecretKey, depth: usize) -> Self {
        Self {
            entries: vec![KeyEntry {
                key_id: initial_key_id.into(),
                key: initial_key,
            }],
            depth: depth.max(1),
        }
    }

    /// Provisions a new current key, pushing the previous current key back
    /// one slot. Keys beyond `depth` fall out of the history entirely.
    pub fn rotate(&mut self, key_id: impl Into<String>, key: SecretKey) {
        self.entries.insert(
            0,
            KeyEntry {
                key_id: key_id.into(),
                key,
            },
        );
        self.entries.truncate(self.depth);
    }

    /// The current key, used to seal new outbound packets.
    #[must_use]
    pub fn current(&self) -> &KeyEntry {
        &self.entries[0]
    }

    /// The key named by `key_id`, if it's still in the history.
    #[must_use]
    pub fn find(&self, key_id: &str) -> Option<&SecretKey> {
        self.entries
            .iter()
            .find(|entry| entry.key_id == key_id)
            .map(|entry| &entry.key)
    }

    /// All retained keys, most-recent-first, for exhaustive trial
    /// decryption when a packet's `key_id` isn't (or is no longer) in the
    /// history.
    pub fn iter_most_recent_first(&self) -> impl Iterator<Item = &KeyEntry> {
        self.entries.iter()
    }
}
