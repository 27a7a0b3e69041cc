//! # Shared Error Types
//!
//! Error variants shared across multiple crates so callers at the sync
//! engine boundary can aggregate them with `#[from]` (§7 Error Handling
//! Design).

use thiserror::Error;

/// Errors related to bearer-token verification (§6, §7 Authentication).
#[derive(Debug, Clone, Error)]
pub enum TokenError {
    #[error("token expired: exp={exp} now={now}")]
    Expired { exp: u64, now: u64 },

    #[error("replay detected: nonce {nonce} already seen")]
    ReplayDetected { nonce: uuid::Uuid },

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("unexpected token type: {received}")]
    WrongTokenType { received: String },
}

/// Operational state of the sync engine's peer loop (§4.3 state machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running,
    Busy,
}
