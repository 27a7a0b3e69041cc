//! Per-record apply rules (§4.3 Apply rules): insert when the local store
//! has no counterpart, otherwise defer to the conflict resolver port.

use chrono::{DateTime, Utc};
use serde_json::Value;
use wm_shared_types::{EntityKey, Source, VectorClock};

/// A record as it arrives over the wire from a peer's `/mesh/pull` or
/// `/mesh/push` payload, already parsed out of its entity-type bucket.
#[derive(Debug, Clone)]
pub struct SyncRecord {
    pub key: EntityKey,
    /// The domain record's own fields, the same JSON object the mutation
    /// interceptor would canonicalize.
    pub payload: Value,
    pub vector_clock: VectorClock,
    pub source: Source,
    pub deleted: bool,
    pub last_updated: DateTime<Utc>,
}

/// What happened to one record during apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// No local counterpart existed; the incoming record was inserted as-is.
    Inserted,
    /// A local counterpart existed; the conflict resolver picked a winner.
    Resolved { winner_is_incoming: bool },
    /// Applying this one record failed; it was skipped and logged, the rest
    /// of the payload still applies (§4.3 Ordering).
    Skipped { reason: String },
}

/// Whether a record needs the conflict resolver at all, or can be inserted
/// directly because the local store has no counterpart for its key.
#[must_use]
pub fn needs_resolution(existing: Option<&SyncRecord>) -> bool {
    existing.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wm_shared_types::EntityType;

    fn record(id: &str) -> SyncRecord {
        SyncRecord {
            key: EntityKey::new(EntityType::Products, id),
            payload: serde_json::json!({}),
            vector_clock: VectorClock::new(),
            source: Source::Pda,
            deleted: false,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn no_existing_record_does_not_need_resolution() {
        assert!(!needs_resolution(None));
    }

    #[test]
    fn existing_record_needs_resolution() {
        let existing = record("w-1");
        assert!(needs_resolution(Some(&existing)));
    }
}
