//! The per-peer, per-cycle entity-type order (§4.3 Ordering): the
//! prerequisite-first order that keeps referential integrity constraints on
//! the store from rejecting an out-of-order apply. `wm-shared-types` owns
//! the canonical ordering since both the mutation interceptor and the sync
//! engine need to agree on it; this module just names it for callers here.

use wm_shared_types::EntityType;

/// The order entity types are synced in, per cycle, per peer.
pub const ENTITY_SYNC_ORDER: [EntityType; 11] = EntityType::APPLY_ORDER;
