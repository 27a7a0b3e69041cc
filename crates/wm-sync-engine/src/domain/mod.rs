//! Pure state, queueing and apply-decision logic for the sync engine; no
//! I/O. The peer loop's actual network round trips live in `service`.

pub mod apply;
pub mod errors;
pub mod peer_loop;
pub mod state_machine;

pub use apply::{needs_resolution, ApplyOutcome, SyncRecord};
pub use errors::SyncEngineError;
pub use peer_loop::ENTITY_SYNC_ORDER;
pub use state_machine::{BoundedSyncQueue, EngineState, SyncRequest};
