//! Pure canonicalization and checksum-combination logic (§4.1).

pub mod canonical;
pub mod checksum;
pub mod ignored_fields;

pub use canonical::{canonicalize, content_hash};
pub use checksum::{children_hash, full_hash};
pub use ignored_fields::{field_kind, FieldKind};
