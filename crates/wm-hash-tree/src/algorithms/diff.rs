//! Comparison algorithm run by the caller over two already-fetched tree
//! views (§4.2). Step 1 (exchanging roots) and the round trips for
//! differing buckets/entities are the caller's (`wm-sync-engine`'s)
//! concern; this module is the pure comparison math steps 2-4 reduce to.

use std::collections::BTreeSet;

use wm_shared_types::{EntityKey, EntityType};

use crate::domain::{BucketView, RootView};

/// `Δ_buckets` from step 2: buckets whose hash differs, plus buckets
/// present on only one side.
#[must_use]
pub fn diff_buckets(local: &RootView, remote: &RootView) -> BTreeSet<char> {
    let all_keys: BTreeSet<char> = local
        .buckets
        .keys()
        .chain(remote.buckets.keys())
        .copied()
        .collect();

    all_keys
        .into_iter()
        .filter(|b| local.buckets.get(b) != remote.buckets.get(b))
        .collect()
}

/// The symmetric diff-by-hash of one bucket's leaf views, split into the
/// ids the local side needs from the peer and the ids the peer needs
/// from the local side (§4.2 step 3-4).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityDiff {
    pub need_from_peer: Vec<EntityKey>,
    pub need_to_peer: Vec<EntityKey>,
}

/// Compute the entity-level diff for one differing bucket.
#[must_use]
pub fn diff_entities(entity_type: EntityType, local: &BucketView, remote: &BucketView) -> EntityDiff {
    let mut diff = EntityDiff::default();
    let all_ids: BTreeSet<&String> = local
        .entities
        .keys()
        .chain(remote.entities.keys())
        .collect();

    for id in all_ids {
        let local_hash = local.entities.get(id);
        let remote_hash = remote.entities.get(id);
        if local_hash == remote_hash {
            continue;
        }
        match (local_hash, remote_hash) {
            (None, Some(_)) => diff
                .need_from_peer
                .push(EntityKey::new(entity_type, id.clone())),
            (Some(_), None) => diff
                .need_to_peer
                .push(EntityKey::new(entity_type, id.clone())),
            (Some(_), Some(_)) => {
                // Present on both sides with different full_hash — the
                // hash alone can't say which is newer, so both sides
                // exchange it and the conflict resolver settles it (§4.5).
                diff.need_from_peer
                    .push(EntityKey::new(entity_type, id.clone()));
                diff.need_to_peer
                    .push(EntityKey::new(entity_type, id.clone()));
            }
            (None, None) => unreachable!("id must come from at least one side"),
        }
    }

    diff
}
