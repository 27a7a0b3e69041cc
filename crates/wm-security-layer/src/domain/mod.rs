//! Packet sealing and key rotation domain logic (§4.6).

pub mod errors;
pub mod keyring;
pub mod packet;

pub use errors::CryptoError;
pub use keyring::{KeyEntry, KeyHistory, DEFAULT_HISTORY_DEPTH};
pub use packet::{open, seal, ALGORITHM};
