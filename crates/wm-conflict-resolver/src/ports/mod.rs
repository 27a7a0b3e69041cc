//! Driven ports the conflict resolver needs from its host.

pub mod outbound;

pub use outbound::{ManualQueue, ManualQueueError, ManualReviewEntry};
