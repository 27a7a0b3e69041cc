//! # `MeshHandshakeToken` — bearer-token claim set
//!
//! The peer HTTP surface (§6) authenticates every request with a
//! short-lived bearer token signed with the mesh-wide secret. This module
//! defines the claim set; signing and verification live in
//! [`crate::security`] alongside the replay-prevention nonce cache.

use serde::{Deserialize, Serialize};

use crate::entities::NodeRole;

/// Claims carried by a mesh bearer token.
///
/// # Security Properties
///
/// - `exp` MUST be checked by verifiers before processing; tokens with
///   `exp <= now` are rejected. §6 bounds token lifetime at 1 hour.
/// - `instance_id` is the sole source of truth for the caller's identity;
///   request bodies MUST NOT duplicate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshHandshakeToken {
    /// The claiming node's stable identity.
    pub instance_id: String,
    pub role: NodeRole,
    /// The base URL the claimant can be reached at.
    pub base_url: String,
    /// Tie-break weight for peer selection.
    pub weight: u32,
    /// Token kind discriminator, always `"mesh_handshake"` on the wire.
    #[serde(rename = "type")]
    pub token_type: String,
    /// Unix timestamp (seconds) after which the token is invalid.
    pub exp: u64,
    /// Issued-at, used as the lower bound of the nonce-cache window.
    pub iat: u64,
    /// Replay-prevention nonce, unique per issued token.
    pub nonce: uuid::Uuid,
}

impl MeshHandshakeToken {
    /// Maximum token lifetime: §6 bounds `exp` at at most 1 hour from issue.
    pub const MAX_LIFETIME_SECS: u64 = 3600;

    pub const TOKEN_TYPE: &'static str = "mesh_handshake";

    #[must_use]
    pub fn is_expired(&self, now_unix_secs: u64) -> bool {
        now_unix_secs >= self.exp
    }
}

/// Outcome of verifying an inbound bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenVerification {
    Valid,
    Expired { exp: u64, now: u64 },
    ReplayDetected { nonce: uuid::Uuid },
    InvalidSignature,
    WrongTokenType { received: String },
}

impl TokenVerification {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, TokenVerification::Valid)
    }
}
