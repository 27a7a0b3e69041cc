//! Per-entity-type ignored-field classification (§4.1 canonicalization
//! step 2).

use wm_shared_types::EntityType;

/// Whether a field participates in the canonical form.
///
/// Realized as an enum rather than a loose string convention so a new
/// derived column has to be classified here before it can silently end up
/// inside a content hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Included in the canonical form.
    Stable,
    /// Excluded: a timestamp the mutation machinery itself advances
    /// (creation time, last-update time, last-sync time), not content.
    Timestamp,
    /// Excluded: computed from other fields of the same record.
    Derived,
}

const ALWAYS_TIMESTAMP: &[&str] = &["created_at", "updated_at", "last_sync_at"];

/// Fields derived from other fields, listed per `EntityType` where they
/// occur. Soft-delete markers are deliberately absent from every list
/// here: §4.1 requires they stay in the canonical form so a tombstone
/// changes the hash like any other mutation.
fn derived_fields(entity_type: EntityType) -> &'static [&'static str] {
    match entity_type {
        EntityType::Quants => &["reserved_quantity", "available_quantity"],
        EntityType::Pickings => &["state_label", "priority_label"],
        EntityType::Shipments => &["eta_computed"],
        EntityType::Partners => &["display_name"],
        _ => &[],
    }
}

/// Classify a field for canonicalization purposes.
#[must_use]
pub fn field_kind(entity_type: EntityType, field: &str) -> FieldKind {
    if ALWAYS_TIMESTAMP.contains(&field) {
        return FieldKind::Timestamp;
    }
    if derived_fields(entity_type).contains(&field) {
        return FieldKind::Derived;
    }
    FieldKind::Stable
}
