//! Bearer-token wire encoding for the peer HTTP surface. `wm_shared_types`
//! defines the claim set and the sign/verify primitives (§6); this module
//! is the one place that decides how a signed token travels inside an
//! `Authorization` header.

use uuid::Uuid;
use wm_shared_types::entities::NodeRole;
use wm_shared_types::envelope::MeshHandshakeToken;
use wm_shared_types::security::{self, current_timestamp, NonceCache};

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct BearerEnvelope {
    token: MeshHandshakeToken,
    signature: [u8; 32],
}

/// Issues a fresh handshake token for this node's own identity and
/// encodes it as a hex-wrapped bearer value for the `Authorization`
/// header, signed with the mesh-wide secret.
#[must_use]
pub fn issue_bearer(
    instance_id: &str,
    role: NodeRole,
    base_url: &str,
    weight: u32,
    mesh_secret: &[u8],
) -> String {
    let token = MeshHandshakeToken {
        instance_id: instance_id.to_string(),
        role,
        base_url: base_url.to_string(),
        weight,
        token_type: MeshHandshakeToken::TOKEN_TYPE.to_string(),
        exp: current_timestamp() + 300,
        iat: current_timestamp(),
        nonce: Uuid::new_v4(),
    };
    let canonical = serde_json::to_vec(&token).expect("token serializes");
    let signature = security::sign_bytes(&canonical, mesh_secret);
    let envelope = BearerEnvelope { token, signature };
    hex::encode(serde_json::to_vec(&envelope).expect("envelope serializes"))
}

/// Errors decoding or verifying an inbound bearer value.
#[derive(Debug, thiserror::Error)]
pub enum BearerError {
    #[error("bearer value is not valid hex")]
    NotHex,
    #[error("bearer envelope is not valid JSON: {0}")]
    Malformed(String),
    #[error("token verification failed: {0:?}")]
    Rejected(wm_shared_types::envelope::TokenVerification),
}

/// Decodes and verifies a bearer value, returning the claimed identity on
/// success.
pub fn verify_bearer(
    bearer: &str,
    nonce_cache: &NonceCache,
    mesh_secret: &[u8],
) -> Result<MeshHandshakeToken, BearerError> {
    let bytes = hex::decode(bearer).map_err(|_| BearerError::NotHex)?;
    let envelope: BearerEnvelope =
        serde_json::from_slice(&bytes).map_err(|e| BearerError::Malformed(e.to_string()))?;
    let canonical = serde_json::to_vec(&envelope.token).expect("token serializes");
    let result = security::verify_token(
        &envelope.token,
        &canonical,
        &envelope.signature,
        nonce_cache,
        mesh_secret,
    );
    if result.is_valid() {
        Ok(envelope.token)
    } else {
        Err(BearerError::Rejected(result))
    }
}
