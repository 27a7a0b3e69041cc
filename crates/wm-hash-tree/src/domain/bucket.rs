//! Bucket-key derivation (§4.2 Bucketing).

use wm_shared_types::{EntityId, EntityKey, EntityType};

/// The bucket key of an entity: the lowercased first character of its
/// `entity_id`, or `_` for an empty id. Yields at most 37 buckets (26
/// letters + 10 digits + the empty-id sentinel).
#[must_use]
pub fn bucket_key_for(entity_id: &EntityId) -> char {
    entity_id
        .chars()
        .next()
        .map(|c| c.to_ascii_lowercase())
        .unwrap_or('_')
}

/// Convenience wrapper matching `EntityKey::bucket_key`, kept here so
/// callers that only have the raw parts don't need to allocate a key.
#[must_use]
pub fn bucket_key(entity_type: EntityType, entity_id: &EntityId) -> char {
    EntityKey::new(entity_type, entity_id.clone()).bucket_key()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_first_character() {
        assert_eq!(bucket_key_for(&"W-100".to_string()), 'w');
    }

    #[test]
    fn empty_id_maps_to_underscore() {
        assert_eq!(bucket_key_for(&String::new()), '_');
    }

    #[test]
    fn digit_first_char_is_its_own_bucket() {
        assert_eq!(bucket_key_for(&"42-abc".to_string()), '4');
    }
}
