//! # Core Domain Entities
//!
//! Defines the core sync-core entities from the data model.
//!
//! ## Clusters
//!
//! - **Identity**: `NodeRole`, `Source`, `PriorityTier`
//! - **Entity addressing**: `EntityType`, `EntityId`, `EntityKey`
//! - **Fingerprinting**: `ChecksumRow`
//! - **Causality**: `VectorClock`, `ClockOrdering`
//! - **Blind relay**: `PacketHeader`, `EncryptedPacket`

use serde::{Deserialize, Serialize};
use std::cmp::Ordering as CmpOrdering;
use std::collections::BTreeMap;

/// A 256-bit hex digest, rendered lowercase without a `0x` prefix.
pub type HexDigest = String;

// =============================================================================
// CLUSTER A: NODE IDENTITY
// =============================================================================

/// The role a node plays in the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// Serves pull/push for all types; initiates nothing on its own.
    Master,
    /// Pulls from master and pushes local-origin entities to master.
    Peer,
    /// Pulls a subset; push limited to physical-scan-origin records.
    Edge,
    /// Untrusted store-and-forward node; does not run the peer loop.
    BlindRelay,
}

/// Origin of a mutation, used by the conflict resolver's priority tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// A handheld scanner (PDA) performing a physical action.
    Pda,
    /// A warehouse-local server.
    LocalServer,
    /// A regional/web-facing server.
    WebServer,
    /// An external ERP or other system of record.
    ExternalApi,
    /// Synthesized internally (e.g. a manual-resolution outcome).
    Internal,
}

/// Fixed priority tier used by the conflict resolver's decision ladder.
///
/// Reference: §4.5 — Physical 100, Local 80, Regional 60, Global 40,
/// External 20, Undefined 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PriorityTier {
    Undefined = 0,
    External = 20,
    Global = 40,
    Regional = 60,
    Local = 80,
    Physical = 100,
}

impl PriorityTier {
    /// Tier assigned to a given mutation `Source`.
    ///
    /// This mapping is a deployment convention, not part of `Source` itself:
    /// the same `Source` can carry different tiers across deployments, but
    /// the sync core ships this as the default.
    #[must_use]
    pub fn for_source(source: Source) -> Self {
        match source {
            Source::Pda => PriorityTier::Physical,
            Source::LocalServer => PriorityTier::Local,
            Source::WebServer => PriorityTier::Regional,
            Source::ExternalApi => PriorityTier::External,
            Source::Internal => PriorityTier::Global,
        }
    }

    #[must_use]
    pub fn weight(self) -> u8 {
        self as u8
    }
}

// =============================================================================
// CLUSTER B: ENTITY ADDRESSING
// =============================================================================

/// The closed tag set of synchronizable entity kinds.
///
/// Plural, Odoo-style vocabulary per the Open Question resolution in
/// `SPEC_FULL.md` §3. `from_legacy_or_plural` translates the singular
/// legacy vocabulary at the one boundary that still emits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Products,
    Locations,
    Quants,
    Lots,
    Packages,
    Pickings,
    Partners,
    Shipments,
    Trackings,
    Devices,
    SyncHistory,
}

impl EntityType {
    /// All entity types, in the prerequisite-first apply order from §4.3:
    /// locations and products before the records that reference them.
    pub const APPLY_ORDER: [EntityType; 11] = [
        EntityType::Locations,
        EntityType::Products,
        EntityType::Partners,
        EntityType::Lots,
        EntityType::Packages,
        EntityType::Quants,
        EntityType::Pickings,
        EntityType::Shipments,
        EntityType::Trackings,
        EntityType::Devices,
        EntityType::SyncHistory,
    ];

    /// Translate a legacy singular tag to the plural vocabulary used
    /// internally. Unknown tags return `None` so a genuinely unrecognized
    /// type reaches validation rather than being silently swallowed.
    #[must_use]
    pub fn from_legacy_or_plural(tag: &str) -> Option<Self> {
        let canonical = match tag {
            "product" | "products" => EntityType::Products,
            "location" | "locations" => EntityType::Locations,
            "quant" | "quants" => EntityType::Quants,
            "lot" | "lots" => EntityType::Lots,
            "package" | "packages" => EntityType::Packages,
            "picking" | "pickings" => EntityType::Pickings,
            "partner" | "partners" => EntityType::Partners,
            "shipment" | "shipments" => EntityType::Shipments,
            "tracking" | "trackings" => EntityType::Trackings,
            "device" | "devices" => EntityType::Devices,
            "sync_history" => EntityType::SyncHistory,
            _ => return None,
        };
        Some(canonical)
    }

    #[must_use]
    pub fn as_wire_str(self) -> &'static str {
        match self {
            EntityType::Products => "products",
            EntityType::Locations => "locations",
            EntityType::Quants => "quants",
            EntityType::Lots => "lots",
            EntityType::Packages => "packages",
            EntityType::Pickings => "pickings",
            EntityType::Partners => "partners",
            EntityType::Shipments => "shipments",
            EntityType::Trackings => "trackings",
            EntityType::Devices => "devices",
            EntityType::SyncHistory => "sync_history",
        }
    }

    /// Whether this entity type admits a physical-action override in the
    /// conflict resolver (§4.5 step 1): items, boxes, places scanned by hand.
    #[must_use]
    pub fn admits_physical_override(self) -> bool {
        matches!(
            self,
            EntityType::Quants | EntityType::Packages | EntityType::Locations
        )
    }
}

/// The string form of a record's natural primary key.
pub type EntityId = String;

/// The unique address of a synchronizable record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    pub entity_type: EntityType,
    pub entity_id: EntityId,
}

impl EntityKey {
    #[must_use]
    pub fn new(entity_type: EntityType, entity_id: impl Into<EntityId>) -> Self {
        Self {
            entity_type,
            entity_id: entity_id.into(),
        }
    }

    /// The bucket key used by the hash tree: the lowercased first byte of
    /// `entity_id`, or `_` for an empty id (§4.2).
    #[must_use]
    pub fn bucket_key(&self) -> char {
        self.entity_id
            .chars()
            .next()
            .map(|c| c.to_ascii_lowercase())
            .unwrap_or('_')
    }
}

// =============================================================================
// CLUSTER C: CHECKSUM ROW
// =============================================================================

/// One fingerprint row per live entity, owned exclusively by the mutation
/// interceptor (§3 Ownership & lifecycle).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumRow {
    pub entity_type: EntityType,
    pub entity_id: EntityId,
    /// 256-bit hex digest of the record's stable fields.
    pub content_hash: HexDigest,
    /// Digest over child full hashes; empty for leaves. Folding in each
    /// child's `full_hash` (not just its `content_hash`) is what lets a
    /// change at any depth of a composite hierarchy propagate all the way
    /// to the root (§3 Invariant).
    pub children_hash: HexDigest,
    /// Deterministic function of `content_hash` and `children_hash`; the
    /// value compared over the wire.
    pub full_hash: HexDigest,
    pub child_count: u64,
    pub last_updated: chrono::DateTime<chrono::Utc>,
    pub source_instance: String,
}

impl ChecksumRow {
    #[must_use]
    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.entity_type, self.entity_id.clone())
    }
}

// =============================================================================
// CLUSTER D: VECTOR CLOCK
// =============================================================================

/// A mapping `instance_id -> monotonic version`, attached to a record
/// whenever it mutates (§3).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorClock(BTreeMap<String, u64>);

/// The relation between two vector clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockOrdering {
    Equal,
    Before,
    After,
    /// Neither dominates.
    Concurrent,
}

impl VectorClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, instance_id: &str) -> u64 {
        self.0.get(instance_id).copied().unwrap_or(0)
    }

    /// Increment this clock's own component and take pair-wise maxima with
    /// `predecessor` (§3: "the mutator increments its own component and
    /// takes pair-wise maxima with the predecessor clock").
    pub fn advance(&mut self, instance_id: &str, predecessor: &VectorClock) {
        for (id, version) in &predecessor.0 {
            let entry = self.0.entry(id.clone()).or_insert(0);
            *entry = (*entry).max(*version);
        }
        let own = self.0.entry(instance_id.to_string()).or_insert(0);
        *own = (*own).max(predecessor.get(instance_id)) + 1;
    }

    /// Iterate `(instance_id, version)` pairs, in instance-id order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(id, version)| (id.as_str(), *version))
    }

    /// Compare two clocks. Equal / Before / After / Concurrent per §3.
    #[must_use]
    pub fn compare(&self, other: &VectorClock) -> ClockOrdering {
        if self.0 == other.0 {
            return ClockOrdering::Equal;
        }
        let mut self_ahead = false;
        let mut other_ahead = false;
        let all_ids = self.0.keys().chain(other.0.keys());
        for id in all_ids {
            match self.get(id).cmp(&other.get(id)) {
                CmpOrdering::Greater => self_ahead = true,
                CmpOrdering::Less => other_ahead = true,
                CmpOrdering::Equal => {}
            }
        }
        match (self_ahead, other_ahead) {
            (true, false) => ClockOrdering::After,
            (false, true) => ClockOrdering::Before,
            (false, false) => ClockOrdering::Equal,
            (true, true) => ClockOrdering::Concurrent,
        }
    }
}

// =============================================================================
// CLUSTER E: BLIND RELAY WIRE FORMS
// =============================================================================

/// The plaintext header of an encrypted packet (§3): the relay indexes and
/// stores by this alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketHeader {
    pub entity_type: EntityType,
    pub entity_id: EntityId,
    pub version: u64,
    pub source_instance: String,
    pub vector_clock: VectorClock,
    pub key_id: String,
    pub algorithm: String,
}

/// The wire form for blind-relay traffic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPacket {
    pub header: PacketHeader,
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
}

// =============================================================================
// CLUSTER F: PEER ROSTER
// =============================================================================

/// A peer's self-description, exchanged during `/mesh/handshake` (§6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerAdvertisement {
    pub instance_id: String,
    pub role: NodeRole,
    pub base_url: String,
    pub weight: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_key_lowercases_first_char() {
        let key = EntityKey::new(EntityType::Products, "A123");
        assert_eq!(key.bucket_key(), 'a');
    }

    #[test]
    fn bucket_key_empty_id_is_underscore() {
        let key = EntityKey::new(EntityType::Products, "");
        assert_eq!(key.bucket_key(), '_');
    }

    #[test]
    fn vector_clock_advance_increments_own_component() {
        let mut clock = VectorClock::new();
        clock.advance("node-a", &VectorClock::new());
        assert_eq!(clock.get("node-a"), 1);
        clock.advance("node-a", &VectorClock::new());
        assert_eq!(clock.get("node-a"), 2);
    }

    #[test]
    fn vector_clock_ordering_before_after() {
        let mut a = VectorClock::new();
        a.advance("node-a", &VectorClock::new());
        let mut b = a.clone();
        b.advance("node-b", &a);

        assert_eq!(a.compare(&b), ClockOrdering::Before);
        assert_eq!(b.compare(&a), ClockOrdering::After);
        assert_eq!(a.compare(&a), ClockOrdering::Equal);
    }

    #[test]
    fn vector_clock_concurrent_when_both_independently_advanced() {
        let base = VectorClock::new();
        let mut a = base.clone();
        a.advance("node-a", &base);
        let mut b = base.clone();
        b.advance("node-b", &base);

        assert_eq!(a.compare(&b), ClockOrdering::Concurrent);
    }

    #[test]
    fn entries_lists_every_instance_in_order() {
        let mut clock = VectorClock::new();
        clock.advance("node-b", &VectorClock::new());
        clock.advance("node-a", &VectorClock::new());
        let ids: Vec<&str> = clock.entries().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["node-a", "node-b"]);
    }

    #[test]
    fn priority_tier_weights_match_spec() {
        assert_eq!(PriorityTier::Physical.weight(), 100);
        assert_eq!(PriorityTier::Local.weight(), 80);
        assert_eq!(PriorityTier::Regional.weight(), 60);
        assert_eq!(PriorityTier::Global.weight(), 40);
        assert_eq!(PriorityTier::External.weight(), 20);
        assert_eq!(PriorityTier::Undefined.weight(), 0);
    }

    #[test]
    fn legacy_alias_translates_singular_tags() {
        assert_eq!(
            EntityType::from_legacy_or_plural("product"),
            Some(EntityType::Products)
        );
        assert_eq!(
            EntityType::from_legacy_or_plural("products"),
            Some(EntityType::Products)
        );
        assert_eq!(EntityType::from_legacy_or_plural("nonsense"), None);
    }
}
