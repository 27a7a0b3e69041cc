//! # Mutation Interceptor
//!
//! For every locally committed insert/update/soft-delete of a
//! synchronizable entity, computes its canonical content hash and upserts
//! the corresponding checksum row (§4.1).
//!
//! ## Architecture
//!
//! Hexagonal, matching the rest of the workspace:
//! - `domain` — canonicalization contract and checksum-row combination math
//! - `ports` — driven ports the host record store must implement
//! - `service` — the driving API, `InterceptorService::on_commit`

#![warn(missing_docs)]
#![allow(missing_docs)]

pub mod domain;
pub mod errors;
pub mod ports;
pub mod service;

pub use domain::{canonicalize, children_hash, content_hash, field_kind, full_hash, FieldKind};
pub use errors::{CanonicalizationError, InterceptorError};
pub use ports::{ChecksumStore, ChecksumStoreError, RecordSource, RecordSourceError};
pub use service::InterceptorService;
