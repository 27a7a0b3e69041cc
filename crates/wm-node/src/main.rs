//! Process entry point: parses CLI flags, brings up telemetry, builds
//! the node container, serves the HTTP surfaces and drives the periodic
//! health/sync cycle until `ctrl_c`.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use wm_connection_manager::{Route, RouteKind};
use wm_node::config::NodeConfig;
use wm_node::container::NodeContainer;
use wm_node::http::mesh::{HandshakeRequest, HandshakeResponse};
use wm_shared_types::NodeRole;
use wm_telemetry::{init_telemetry, TelemetryConfig};

/// Runs one node of the warehouse synchronization mesh.
#[derive(Parser, Debug)]
#[command(name = "wm-node", version, about)]
struct Cli {
    /// This node's instance id. Required in production; defaults are
    /// rejected by `NodeConfig::validate_for_production`.
    #[arg(long, env = "WM_INSTANCE_ID")]
    instance_id: Option<String>,

    /// This node's role in the mesh.
    #[arg(long, env = "WM_ROLE", value_enum)]
    role: Option<CliRole>,

    /// This node's own externally reachable base URL, advertised to peers.
    #[arg(long, env = "WM_BASE_URL")]
    base_url: Option<String>,

    /// Bind address for the peer HTTP surface.
    #[arg(long, env = "WM_PEER_BIND_ADDR")]
    peer_bind_addr: Option<String>,

    /// Bind address for the blind-relay HTTP surface.
    #[arg(long, env = "WM_RELAY_BIND_ADDR")]
    relay_bind_addr: Option<String>,

    /// Mesh handshake secret, hex-encoded (32 bytes).
    #[arg(long, env = "WM_MESH_SECRET")]
    mesh_secret_hex: Option<String>,

    /// Peer base URL to handshake with at startup. Repeatable.
    #[arg(long = "bootstrap-peer", env = "WM_BOOTSTRAP_PEERS", value_delimiter = ',')]
    bootstrap_peers: Vec<String>,

    /// Run the first health/sync cycle immediately at startup instead of
    /// waiting out the first interval.
    #[arg(long, env = "WM_SYNC_ON_STARTUP")]
    sync_on_startup: Option<bool>,

    /// Skip the all-zero-secret guard, for local development only.
    #[arg(long, env = "WM_INSECURE_DEV_MODE")]
    insecure_dev_mode: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CliRole {
    Master,
    Peer,
    Edge,
    BlindRelay,
}

impl From<CliRole> for NodeRole {
    fn from(role: CliRole) -> Self {
        match role {
            CliRole::Master => NodeRole::Master,
            CliRole::Peer => NodeRole::Peer,
            CliRole::Edge => NodeRole::Edge,
            CliRole::BlindRelay => NodeRole::BlindRelay,
        }
    }
}

fn build_config(cli: Cli) -> NodeConfig {
    let mut config = NodeConfig::default();

    if let Some(instance_id) = cli.instance_id {
        config.network.instance_id = instance_id;
    }
    if let Some(role) = cli.role {
        config.network.role = role.into();
    }
    if let Some(base_url) = cli.base_url {
        config.network.base_url = base_url;
    }
    if let Some(peer_bind_addr) = cli.peer_bind_addr {
        config.network.peer_bind_addr = peer_bind_addr;
    }
    if let Some(relay_bind_addr) = cli.relay_bind_addr {
        config.network.relay_bind_addr = relay_bind_addr;
    }
    if !cli.bootstrap_peers.is_empty() {
        config.network.bootstrap_peers = cli.bootstrap_peers;
    }
    if let Some(sync_on_startup) = cli.sync_on_startup {
        config.sync.sync_on_startup = sync_on_startup;
    }
    if let Some(hex_secret) = cli.mesh_secret_hex {
        match hex::decode(&hex_secret) {
            Ok(bytes) if bytes.len() == 32 => {
                let mut secret = [0u8; 32];
                secret.copy_from_slice(&bytes);
                config.security.mesh_secret = secret;
            }
            _ => {
                eprintln!("WM_MESH_SECRET must be 32 bytes of hex, ignoring");
            }
        }
    }

    if !cli.insecure_dev_mode {
        config.validate_for_production();
    }

    config
}

/// Handshakes with every configured bootstrap peer once at startup,
/// registering each as a known, reachable peer before the sync loop's
/// first tick. A peer that doesn't answer is logged and skipped — it may
/// still reach this node first, or come back on a later restart.
async fn bootstrap_peers(container: &NodeContainer) {
    if container.config.network.bootstrap_peers.is_empty() {
        return;
    }

    let client = reqwest::Client::new();
    for base_url in &container.config.network.bootstrap_peers {
        let bearer = wm_node::security::issue_bearer(
            &container.config.network.instance_id,
            container.config.network.role,
            &container.config.network.base_url,
            10,
            &container.config.security.mesh_secret,
        );

        let result = client
            .post(format!("{base_url}/mesh/handshake"))
            .bearer_auth(bearer)
            .json(&HandshakeRequest {
                base_url: container.config.network.base_url.clone(),
                weight: 10,
            })
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);

        match result {
            Ok(response) => match response.json::<HandshakeResponse>().await {
                Ok(handshake) => {
                    let peer = handshake.self_advertisement;
                    container.connections.configure_peer(
                        peer.instance_id.clone(),
                        vec![Route::new(&peer.base_url, RouteKind::Primary, Duration::from_secs(5), 0)],
                    );
                    container.roster.upsert(peer);
                    info!(%base_url, "bootstrap handshake succeeded");
                }
                Err(error) => error!(%base_url, %error, "bootstrap handshake response was malformed"),
            },
            Err(error) => error!(%base_url, %error, "bootstrap handshake failed"),
        }
    }
}

/// Drives the health-probe and sync-request cycle on a fixed interval,
/// running until the container's engine is stopped. `sync.sync_on_startup`
/// (§6 "auto-sync on startup flag") controls whether the first sync cycle
/// fires immediately or waits out one full `sync_cycle_interval`; the
/// health cycle always fires immediately, same as `tokio::interval`'s
/// default.
async fn run_sync_loop(container: Arc<NodeContainer>) {
    let start = if container.config.sync.sync_on_startup {
        tokio::time::Instant::now()
    } else {
        tokio::time::Instant::now() + container.config.sync.sync_cycle_interval
    };
    let mut health_ticker = tokio::time::interval(container.config.sync.health_cycle_interval);
    let mut sync_ticker = tokio::time::interval_at(start, container.config.sync.sync_cycle_interval);

    loop {
        tokio::select! {
            _ = health_ticker.tick() => {
                container.connections.run_health_cycle().await;
            }
            _ = sync_ticker.tick() => {
                for peer in container.engine.known_peers().await {
                    container.engine.request_sync(peer.instance_id, 5).await;
                }
                container.engine.drain().await;
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = build_config(cli);

    let telemetry_config = TelemetryConfig::for_instance(&config.network.instance_id);
    let _telemetry_guard = match init_telemetry(telemetry_config) {
        Ok(guard) => guard,
        Err(error) => {
            eprintln!("failed to initialize telemetry: {error}");
            std::process::exit(1);
        }
    };

    info!(
        instance_id = %config.network.instance_id,
        role = ?config.network.role,
        "starting node"
    );

    let container = Arc::new(NodeContainer::new(config));
    bootstrap_peers(&container).await;

    let sync_loop_container = container.clone();
    let sync_loop = tokio::spawn(run_sync_loop(sync_loop_container));

    wm_node::http::run(container).await;
    info!("HTTP surfaces stopped");

    sync_loop.abort();
}
