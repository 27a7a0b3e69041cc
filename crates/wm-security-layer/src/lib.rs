//! Seals and opens the blind relay's opaque packets (§4.6): AES-256-GCM
//! over the payload with the plaintext header bound in as AAD, a short
//! key history for rotation, and the relay mailbox itself.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Module Structure
//!
//! ```text
//! wm-security-layer/
//! ├── domain/   # packet seal/open, KeyHistory
//! ├── ports/    # RelayStore
//! ├── adapters/ # InMemoryRelayMailbox
//! └── service/  # SecurityLayer
//! ```

#![allow(missing_docs)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{open, seal, CryptoError, KeyHistory, ALGORITHM};
pub use ports::{RelayError, RelayStore};
pub use service::SecurityLayer;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
