//! Driven ports this crate relies on for persistence.

mod outbound;

pub use outbound::{RelayError, RelayStore};
