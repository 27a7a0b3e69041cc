//! The decision ladder and its inputs; no I/O.

pub mod candidate;
pub mod ladder;

pub use candidate::{originating_instance, Candidate};
pub use ladder::{resolve, resolve_with_window, Outcome, ResolutionStrategy, DEFAULT_SIMULTANEITY_WINDOW};
