//! Leaf view, bucket hash and root hash construction (§4.2 Node values).

use std::collections::BTreeMap;

use wm_shared_types::{ChecksumRow, EntityId, HexDigest};

use super::bucket::bucket_key_for;

/// Ordered mapping `entity_id -> full_hash` for every entity in one
/// bucket, sorted by `entity_id` (§4.2 Leaf view).
pub type LeafView = BTreeMap<EntityId, HexDigest>;

/// `{root_hash, bucket -> bucket_hash}` — the response to `root()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootView {
    pub root_hash: String,
    pub buckets: BTreeMap<char, String>,
}

/// `{bucket_hash, entity_id -> full_hash}` — the response to `bucket()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketView {
    pub bucket_hash: String,
    pub entities: LeafView,
}

/// Build the leaf view for one bucket from its checksum rows.
#[must_use]
pub fn leaf_view(rows: &[ChecksumRow]) -> LeafView {
    rows.iter()
        .map(|row| (row.entity_id.clone(), row.full_hash.clone()))
        .collect()
}

/// Digest of `id1:full_hash1;id2:full_hash2;...` over the sorted leaf
/// view, truncated to 64 bits of hex (§4.2 Bucket hash). An empty bucket
/// hashes to the empty string.
#[must_use]
pub fn bucket_hash(leaf: &LeafView) -> String {
    if leaf.is_empty() {
        return String::new();
    }
    let concatenated = leaf
        .iter()
        .map(|(id, hash)| format!("{id}:{hash}"))
        .collect::<Vec<_>>()
        .join(";");
    truncate_64(&wm_shared_crypto::sha256_hash(concatenated.as_bytes()))
}

/// Digest of `bucket:bucket_hash;...` over non-empty buckets in sorted
/// key order, truncated to 64 bits of hex (§4.2 Root hash). A table with
/// no entities at all yields the empty-table sentinel: the empty string
/// (§8 Boundary behaviors).
#[must_use]
pub fn root_hash(buckets: &BTreeMap<char, String>) -> String {
    let non_empty: Vec<(&char, &String)> = buckets.iter().filter(|(_, h)| !h.is_empty()).collect();
    if non_empty.is_empty() {
        return String::new();
    }
    let concatenated = non_empty
        .iter()
        .map(|(b, h)| format!("{b}:{h}"))
        .collect::<Vec<_>>()
        .join(";");
    truncate_64(&wm_shared_crypto::sha256_hash(concatenated.as_bytes()))
}

/// Build the full `RootView` from every checksum row of one entity type.
/// Rebuild-every-call: the tree is never persisted between comparisons
/// (§4.2 Invariants).
#[must_use]
pub fn build_root(rows: &[ChecksumRow]) -> RootView {
    let mut by_bucket: BTreeMap<char, Vec<ChecksumRow>> = BTreeMap::new();
    for row in rows {
        let bucket = bucket_key_for(&row.entity_id);
        by_bucket.entry(bucket).or_default().push(row.clone());
    }

    let mut buckets = BTreeMap::new();
    for (bucket, bucket_rows) in &by_bucket {
        buckets.insert(*bucket, bucket_hash(&leaf_view(bucket_rows)));
    }

    let root = root_hash(&buckets);
    RootView {
        root_hash: root,
        buckets,
    }
}

/// Build the `BucketView` for one bucket's rows.
#[must_use]
pub fn build_bucket(rows: &[ChecksumRow]) -> BucketView {
    let entities = leaf_view(rows);
    let hash = bucket_hash(&entities);
    BucketView {
        bucket_hash: hash,
        entities,
    }
}

/// Truncate a 32-byte digest to its first 64 bits, hex-encoded.
fn truncate_64(hash: &[u8; 32]) -> String {
    hex::encode(&hash[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wm_shared_types::EntityType;

    fn row(entity_id: &str, full_hash: &str) -> ChecksumRow {
        ChecksumRow {
            entity_type: EntityType::Products,
            entity_id: entity_id.to_string(),
            content_hash: full_hash.to_string(),
            children_hash: String::new(),
            full_hash: full_hash.to_string(),
            child_count: 0,
            last_updated: Utc::now(),
            source_instance: "node-a".to_string(),
        }
    }

    #[test]
    fn empty_bucket_hashes_to_empty_string() {
        assert_eq!(bucket_hash(&LeafView::new()), "");
    }

    #[test]
    fn empty_table_root_is_sentinel() {
        let view = build_root(&[]);
        assert_eq!(view.root_hash, "");
        assert!(view.buckets.is_empty());
    }

    #[test]
    fn bucket_hash_is_order_independent() {
        let rows_a = vec![row("w-1", "h1"), row("w-2", "h2")];
        let rows_b = vec![row("w-2", "h2"), row("w-1", "h1")];
        assert_eq!(bucket_hash(&leaf_view(&rows_a)), bucket_hash(&leaf_view(&rows_b)));
    }

    #[test]
    fn root_hash_changes_when_a_bucket_hash_changes() {
        let rows = vec![row("w-1", "h1")];
        let before = build_root(&rows);
        let rows_changed = vec![row("w-1", "h1-changed")];
        let after = build_root(&rows_changed);
        assert_ne!(before.root_hash, after.root_hash);
    }

    #[test]
    fn rebuild_is_byte_identical() {
        let rows = vec![row("w-1", "h1"), row("a-1", "h2")];
        assert_eq!(build_root(&rows), build_root(&rows));
    }

    #[test]
    fn root_hash_is_truncated_to_64_bits() {
        let rows = vec![row("w-1", "h1")];
        let view = build_root(&rows);
        assert_eq!(view.root_hash.len(), 16);
    }

    #[test]
    fn entities_group_into_separate_buckets_by_first_char() {
        let rows = vec![row("a-1", "h1"), row("b-1", "h2")];
        let view = build_root(&rows);
        assert_eq!(view.buckets.len(), 2);
        assert!(view.buckets.contains_key(&'a'));
        assert!(view.buckets.contains_key(&'b'));
    }
}
