//! Concrete adapters for this crate's driven ports.

pub mod relay_mailbox;

pub use relay_mailbox::{InMemoryRelayMailbox, DEFAULT_RETENTION};
