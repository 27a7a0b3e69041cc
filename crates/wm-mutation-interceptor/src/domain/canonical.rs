//! Canonicalization contract (§4.1 steps 1-5).

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde_json::{Number, Value};
use wm_shared_types::EntityType;

use super::ignored_fields::{field_kind, FieldKind};
use crate::errors::CanonicalizationError;

/// Render a committed record's canonical `k1:v1;k2:v2;...` form.
///
/// `record` must already be shaped as a JSON object — the one boundary
/// where the host's ORM/ODM layer hands a record to this crate. Keys are
/// sorted lexicographically (step 3); ignored fields are dropped first
/// (step 2); scalars are rendered by [`render_scalar`] (step 4).
pub fn canonicalize(
    entity_type: EntityType,
    record: &Value,
) -> Result<String, CanonicalizationError> {
    let object = record
        .as_object()
        .ok_or(CanonicalizationError::NotAnObject)?;

    let mut fields: BTreeMap<&str, &Value> = BTreeMap::new();
    for (key, value) in object {
        match field_kind(entity_type, key) {
            FieldKind::Timestamp | FieldKind::Derived => continue,
            FieldKind::Stable => {
                fields.insert(key.as_str(), value);
            }
        }
    }

    let mut rendered = String::new();
    for (i, (key, value)) in fields.iter().enumerate() {
        if i > 0 {
            rendered.push(';');
        }
        rendered.push_str(key);
        rendered.push(':');
        rendered.push_str(&render_scalar(value, key)?);
    }
    Ok(rendered)
}

/// Render one field's value. `null` is rendered literally; numbers use
/// their shortest natural textual form, with floats routed through
/// `rust_decimal` so the string survives a JSON round trip without
/// precision drift (step 4). Arrays and nested objects have no defined
/// canonical scalar form and are rejected.
///
/// `false` is normalized to an empty string (§9): some peers emit boolean
/// `false` where others emit an empty string for the same "unset" field,
/// and both must canonicalize identically or their `content_hash`es never
/// converge.
fn render_scalar(value: &Value, field: &str) -> Result<String, CanonicalizationError> {
    match value {
        Value::Null => Ok("null".to_string()),
        Value::Bool(false) => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => render_number(n, field),
        Value::Array(_) | Value::Object(_) => Err(CanonicalizationError::UnrepresentableValue(
            field.to_string(),
        )),
    }
}

fn render_number(n: &Number, field: &str) -> Result<String, CanonicalizationError> {
    if let Some(i) = n.as_i64() {
        return Ok(i.to_string());
    }
    if let Some(u) = n.as_u64() {
        return Ok(u.to_string());
    }
    let f = n
        .as_f64()
        .ok_or_else(|| CanonicalizationError::UnrepresentableValue(field.to_string()))?;
    let decimal = Decimal::from_f64_retain(f)
        .ok_or_else(|| CanonicalizationError::UnrepresentableValue(field.to_string()))?;
    Ok(decimal.normalize().to_string())
}

/// Hash a canonical string with the wire-format digest (step 5).
#[must_use]
pub fn content_hash(canonical: &str) -> String {
    hex::encode(wm_shared_crypto::sha256_hash(canonical.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn drops_timestamps_and_sorts_keys() {
        let record = json!({
            "sku": "W-100",
            "created_at": "2026-01-01T00:00:00Z",
            "quantity": 4,
        });
        let canonical = canonicalize(EntityType::Products, &record).unwrap();
        assert_eq!(canonical, "quantity:4;sku:W-100");
    }

    #[test]
    fn drops_derived_fields_per_entity_type() {
        let record = json!({
            "reserved_quantity": 2,
            "on_hand": 10,
        });
        let canonical = canonicalize(EntityType::Quants, &record).unwrap();
        assert_eq!(canonical, "on_hand:10");
    }

    #[test]
    fn null_renders_literally() {
        let record = json!({ "lot_id": null });
        let canonical = canonicalize(EntityType::Lots, &record).unwrap();
        assert_eq!(canonical, "lot_id:null");
    }

    #[test]
    fn retains_soft_delete_marker() {
        let live = json!({ "sku": "W-1", "deleted_at": null });
        let deleted = json!({ "sku": "W-1", "deleted_at": "2026-02-01T00:00:00Z" });
        assert_ne!(
            canonicalize(EntityType::Products, &live).unwrap(),
            canonicalize(EntityType::Products, &deleted).unwrap()
        );
    }

    #[test]
    fn float_survives_round_trip_without_drift() {
        let record = json!({ "weight": 0.1 });
        let canonical = canonicalize(EntityType::Products, &record).unwrap();
        assert_eq!(canonical, "weight:0.1");
    }

    #[test]
    fn rejects_nested_object() {
        let record = json!({ "sku": "W-1", "meta": { "a": 1 } });
        assert!(matches!(
            canonicalize(EntityType::Products, &record),
            Err(CanonicalizationError::UnrepresentableValue(f)) if f == "meta"
        ));
    }

    #[test]
    fn idempotent_across_field_iteration_order() {
        let a = json!({ "b": 2, "a": 1 });
        let b = json!({ "a": 1, "b": 2 });
        assert_eq!(
            canonicalize(EntityType::Products, &a).unwrap(),
            canonicalize(EntityType::Products, &b).unwrap()
        );
    }

    #[test]
    fn false_normalizes_to_empty_string() {
        let via_bool = json!({ "sku": "W-1", "note": false });
        let via_empty = json!({ "sku": "W-1", "note": "" });
        assert_eq!(
            canonicalize(EntityType::Products, &via_bool).unwrap(),
            canonicalize(EntityType::Products, &via_empty).unwrap()
        );
    }

    #[test]
    fn content_hash_is_deterministic() {
        let canonical = "sku:W-1;quantity:4";
        assert_eq!(content_hash(canonical), content_hash(canonical));
    }
}
