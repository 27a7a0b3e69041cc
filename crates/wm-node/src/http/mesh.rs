//! Peer surface handlers (§6): `/mesh/handshake`, `/mesh/nodes`,
//! `/mesh/merkle`, `/mesh/pull`, `/mesh/push`, `/health`.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use wm_connection_manager::{Route, RouteKind};
use wm_hash_tree::ports::ChecksumSource;
use wm_shared_types::{EntityKey, EntityType, PeerAdvertisement};
use wm_sync_engine::ports::{ConflictResolver, EntityStore};
use wm_sync_engine::SyncRecord;

use crate::http::wire::{to_entity_keys, BucketViewDto, PullRequest, PullResponse, PushRequest, RootViewDto};
use crate::http::AppState;
use crate::security::{verify_bearer, BearerError};

#[derive(Debug, Deserialize)]
pub struct HandshakeRequest {
    pub base_url: String,
    pub weight: u32,
}

#[derive(Debug, Serialize)]
pub struct HandshakeResponse {
    pub self_advertisement: PeerAdvertisement,
}

fn bearer_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Verifies the caller's bearer token, returning the claimed identity.
fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<wm_shared_types::envelope::MeshHandshakeToken, StatusCode> {
    let bearer = bearer_header(headers).ok_or(StatusCode::UNAUTHORIZED)?;
    verify_bearer(bearer, &state.nonce_cache, &state.container.config.security.mesh_secret)
        .map_err(|e| match e {
            BearerError::Rejected(_) => StatusCode::UNAUTHORIZED,
            BearerError::NotHex | BearerError::Malformed(_) => StatusCode::BAD_REQUEST,
        })
}

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({"status": "healthy", "service": "wm-node"}))
}

pub async fn handshake(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<HandshakeRequest>,
) -> Result<Json<HandshakeResponse>, StatusCode> {
    let claims = authenticate(&state, &headers)?;

    state.container.connections.configure_peer(
        claims.instance_id.clone(),
        vec![Route::new(&body.base_url, RouteKind::Primary, Duration::from_secs(5), 0)],
    );
    state.container.roster.upsert(PeerAdvertisement {
        instance_id: claims.instance_id,
        role: claims.role,
        base_url: body.base_url,
        weight: body.weight,
    });

    let self_advertisement = PeerAdvertisement {
        instance_id: state.container.config.network.instance_id.clone(),
        role: state.container.config.network.role,
        base_url: state.container.config.network.base_url.clone(),
        weight: 10,
    };
    Ok(Json(HandshakeResponse { self_advertisement }))
}

pub async fn list_nodes(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<PeerAdvertisement>>, StatusCode> {
    authenticate(&state, &headers)?;
    Ok(Json(state.container.roster.all_peers()))
}

pub async fn merkle_root(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(entity_type): Path<String>,
) -> Result<Json<RootViewDto>, StatusCode> {
    authenticate(&state, &headers)?;
    let entity_type = parse_entity_type(&entity_type)?;
    let view = state
        .container
        .store
        .rows_for(entity_type)
        .await
        .map(|rows| wm_hash_tree::build_root(&rows))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(view.into()))
}

pub async fn merkle_bucket(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((entity_type, bucket)): Path<(String, String)>,
) -> Result<Json<BucketViewDto>, StatusCode> {
    authenticate(&state, &headers)?;
    let entity_type = parse_entity_type(&entity_type)?;
    let bucket = bucket.chars().next().ok_or(StatusCode::BAD_REQUEST)?;

    let rows = state
        .container
        .store
        .rows_for(entity_type)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    let scoped: Vec<_> = rows
        .into_iter()
        .filter(|r| wm_hash_tree::bucket_key(entity_type, &r.entity_id) == bucket)
        .collect();
    Ok(Json(wm_hash_tree::build_bucket(&scoped).into()))
}

pub async fn pull(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PullRequest>,
) -> Result<Json<PullResponse>, StatusCode> {
    authenticate(&state, &headers)?;
    let keys: Vec<EntityKey> = to_entity_keys(body.entity_type, body.entity_ids);
    let mut records = Vec::with_capacity(keys.len());
    for key in &keys {
        if let Ok(Some(record)) = EntityStore::get(state.container.store.as_ref(), key).await {
            records.push(record.into());
        }
    }
    Ok(Json(PullResponse { records }))
}

pub async fn push(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<PushRequest>,
) -> Result<StatusCode, StatusCode> {
    authenticate(&state, &headers)?;
    for dto in body.records {
        let record: SyncRecord = dto.into();
        if let Err(reason) = apply_incoming(&state, record).await {
            tracing::warn!(%reason, "skipped pushed record, continuing payload");
        }
    }
    Ok(StatusCode::ACCEPTED)
}

async fn apply_incoming(state: &AppState, record: SyncRecord) -> Result<(), String> {
    let existing = EntityStore::get(state.container.store.as_ref(), &record.key)
        .await
        .map_err(|e| e.to_string())?;

    let key = record.key.clone();
    match existing {
        None => {
            EntityStore::upsert(state.container.store.as_ref(), record)
                .await
                .map_err(|e| e.to_string())?;
        }
        Some(existing) => {
            let resolution = state.container.resolver.resolve(&existing, &record).await;
            if resolution.winner_is_incoming {
                EntityStore::upsert(state.container.store.as_ref(), record)
                    .await
                    .map_err(|e| e.to_string())?;
            }
        }
    }

    state
        .container
        .interceptor
        .on_commit(key)
        .await
        .map_err(|e| e.to_string())
}

fn parse_entity_type(raw: &str) -> Result<EntityType, StatusCode> {
    EntityType::from_legacy_or_plural(raw).ok_or(StatusCode::NOT_FOUND)
}
