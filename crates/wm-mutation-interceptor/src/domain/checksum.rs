//! Checksum row combination logic (§3 Checksum row, §4.1 upsert semantics).

/// Build `children_hash` from a sorted `(entity_id, full_hash)` list:
/// "digest over child full hashes, empty for leaves" (§3). Callers must
/// pass each child's `full_hash`, not its bare `content_hash`, so a change
/// at any depth of a composite hierarchy reaches every ancestor.
#[must_use]
pub fn children_hash(children: &[(String, String)]) -> String {
    if children.is_empty() {
        return String::new();
    }
    let mut sorted = children.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let concatenated = sorted
        .iter()
        .map(|(id, hash)| format!("{id}:{hash}"))
        .collect::<Vec<_>>()
        .join(";");
    hex::encode(wm_shared_crypto::sha256_hash(concatenated.as_bytes()))
}

/// Combine `content_hash` and `children_hash` into `full_hash`, the value
/// compared over the wire (§3). A leaf (`children_hash` empty) has
/// `full_hash == content_hash`.
#[must_use]
pub fn full_hash(content_hash: &str, children_hash: &str) -> String {
    if children_hash.is_empty() {
        return content_hash.to_string();
    }
    let concatenated = format!("{content_hash}:{children_hash}");
    hex::encode(wm_shared_crypto::sha256_hash(concatenated.as_bytes()))
}
