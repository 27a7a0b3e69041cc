//! Peer and relay HTTP surfaces (§6), each its own `axum::Router` spawned
//! on its own bind address, modeled on the teacher's
//! `qc-16-api-gateway::service::ApiGatewayService`: per-surface router
//! builders, one `tokio::spawn` per listener, `tokio::select!` against a
//! shutdown signal.

pub mod mesh;
pub mod relay;
pub mod wire;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use wm_shared_types::security::NonceCache;

use crate::container::NodeContainer;

#[derive(Clone)]
pub struct AppState {
    pub container: Arc<NodeContainer>,
    pub nonce_cache: Arc<NonceCache>,
}

/// Builds the peer surface's router directly, for tests that need to
/// drive it without going through [`run`]'s bind-and-spawn lifecycle.
pub fn build_mesh_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(mesh::health_check))
        .route("/mesh/handshake", post(mesh::handshake))
        .route("/mesh/nodes", get(mesh::list_nodes))
        .route("/mesh/merkle/:entity_type", get(mesh::merkle_root))
        .route("/mesh/merkle/:entity_type/:bucket", get(mesh::merkle_bucket))
        .route("/mesh/pull", post(mesh::pull))
        .route("/mesh/push", post(mesh::push))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Builds the blind-relay surface's router directly, for the same
/// reason as [`build_mesh_router`].
pub fn build_relay_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(mesh::health_check))
        .route("/sync/push", post(relay::relay_push))
        .route("/sync/pull", get(relay::relay_pull))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves a router until `shutdown` resolves, logging bind failures
/// instead of panicking the whole process over one surface.
async fn serve(bind_addr: String, router: Router, shutdown: impl std::future::Future<Output = ()> + Send + 'static) {
    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(error) => {
            error!(%bind_addr, %error, "failed to bind HTTP surface");
            return;
        }
    };
    info!(%bind_addr, "HTTP surface listening");
    if let Err(error) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
    {
        error!(%bind_addr, %error, "HTTP surface exited with error");
    }
}

/// Spawns the peer surface always, and the relay surface only for a
/// `BlindRelay`-role node, racing both against `ctrl_c` for shutdown.
pub async fn run(container: Arc<NodeContainer>) {
    let state = AppState {
        container: container.clone(),
        nonce_cache: Arc::new(NonceCache::new()),
    };

    let peer_bind = container.config.network.peer_bind_addr.clone();
    let relay_bind = container.config.network.relay_bind_addr.clone();
    let is_relay = container.config.network.role == wm_shared_types::NodeRole::BlindRelay;

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    let mut peer_rx = shutdown_tx.subscribe();
    let peer_state = state.clone();
    let peer_task = tokio::spawn(async move {
        serve(peer_bind, build_mesh_router(peer_state), async move {
            let _ = peer_rx.recv().await;
        })
        .await;
    });

    let relay_task = if is_relay {
        let mut relay_rx = shutdown_tx.subscribe();
        let relay_state = state.clone();
        Some(tokio::spawn(async move {
            serve(relay_bind, build_relay_router(relay_state), async move {
                let _ = relay_rx.recv().await;
            })
            .await;
        }))
    } else {
        None
    };

    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received, stopping HTTP surfaces");
    let _ = shutdown_tx.send(());

    let _ = peer_task.await;
    if let Some(task) = relay_task {
        let _ = task.await;
    }
}

/// Prometheus text exposition, scraped by the node's own metrics port.
pub async fn metrics_handler() -> Result<String, StatusCode> {
    wm_telemetry::encode_metrics().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
