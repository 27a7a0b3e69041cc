//! Decides a winner between two versions of the same record: vector-clock
//! dominance first, then a physical-action override and priority/wall-clock/
//! instance-id tie-breaks for genuinely concurrent edits (§4.5).
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Module Structure
//!
//! ```text
//! wm-conflict-resolver/
//! ├── domain/   # Candidate, the resolve() decision ladder
//! ├── ports/    # ManualQueue
//! └── service/  # ConflictResolverService, the wm-sync-engine adapter
//! ```

#![allow(missing_docs)]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{resolve, resolve_with_window, Candidate, Outcome, ResolutionStrategy};
pub use ports::{ManualQueue, ManualQueueError, ManualReviewEntry};
pub use service::ConflictResolverService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
