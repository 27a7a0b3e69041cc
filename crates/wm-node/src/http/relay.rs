//! Blind-relay surface handlers (§6): `/sync/push`, `/sync/pull`. A node
//! running this surface never decrypts or resolves anything — it only
//! stores and forwards opaque `EncryptedPacket`s through the security
//! layer's mailbox (§4.6).

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use wm_shared_types::EncryptedPacket;

use crate::http::wire::RelayPullQuery;
use crate::http::AppState;

#[derive(Debug, Deserialize)]
pub struct RelayPushRequest {
    pub recipient_instance_id: String,
    pub packet: EncryptedPacket,
}

pub async fn relay_push(
    State(state): State<AppState>,
    Json(body): Json<RelayPushRequest>,
) -> Result<StatusCode, StatusCode> {
    state
        .container
        .security
        .deposit_for_relay(&body.recipient_instance_id, body.packet)
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn relay_pull(
    State(state): State<AppState>,
    Query(query): Query<RelayPullQuery>,
) -> Result<Json<Vec<EncryptedPacket>>, StatusCode> {
    let packets = state
        .container
        .security
        .pull_from_relay(
            &query.recipient_instance_id,
            query.entity_type,
            query.since_version,
            query.limit,
        )
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;
    Ok(Json(packets))
}
