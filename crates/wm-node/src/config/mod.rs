//! Node configuration: one nested `*Config` struct per subsystem, each
//! with a sane [`Default`], assembled into [`NodeConfig`] and overridable
//! from the CLI in `main.rs`.

use std::time::Duration;

use wm_shared_types::NodeRole;

/// Top-level node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub network: NetworkConfig,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
    pub sync: SyncConfig,
    pub resolver: ResolverConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            storage: StorageConfig::default(),
            security: SecurityConfig::default(),
            sync: SyncConfig::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Refuses to start a `Master`/`Peer`/`Edge` node with the default
    /// all-zero mesh secret, matching the teacher's production HMAC-secret
    /// guard (§6: every bearer token is signed with this value).
    ///
    /// # Panics
    ///
    /// Panics if `security.mesh_secret` is still `[0u8; 32]`.
    pub fn validate_for_production(&self) {
        if self.security.mesh_secret == [0u8; 32] {
            panic!(
                "refusing to start with the default all-zero mesh secret; set \
                 WM_MESH_SECRET or pass --mesh-secret-hex"
            );
        }
    }
}

/// Network identity and HTTP surface bind addresses.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// This node's stable identity, carried in every `MeshHandshakeToken`
    /// and `PacketHeader::source_instance`.
    pub instance_id: String,
    pub role: NodeRole,
    /// The base URL peers reach this node at (advertised at handshake).
    pub base_url: String,
    /// Bind address for the peer surface (`/mesh/*`, `/health`).
    pub peer_bind_addr: String,
    /// Bind address for the relay surface (`/sync/*`). Only a
    /// `NodeRole::BlindRelay` node needs to expose this.
    pub relay_bind_addr: String,
    /// Peer base URLs to handshake with at startup, before this node has
    /// ever been discovered by anyone else.
    pub bootstrap_peers: Vec<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            instance_id: "unset".to_string(),
            role: NodeRole::Peer,
            base_url: "http://127.0.0.1:7800".to_string(),
            peer_bind_addr: "0.0.0.0:7800".to_string(),
            relay_bind_addr: "0.0.0.0:7801".to_string(),
            bootstrap_peers: Vec::new(),
        }
    }
}

/// Persisted-state backend selection (§6 "(added)" persistence note).
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// `sqlite::memory:` for tests/dev-default, or a file path DSN for a
    /// durable local store.
    pub database_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
        }
    }
}

/// Mesh-wide bearer-token secret and the initial AEAD key for blind-relay
/// traffic (§4.6, §6).
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub mesh_secret: [u8; 32],
    pub initial_key_id: String,
    pub initial_key: [u8; 32],
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            mesh_secret: [0u8; 32],
            initial_key_id: "k-1".to_string(),
            initial_key: [0u8; 32],
        }
    }
}

/// Sync engine and connection manager tuning.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub queue_capacity: usize,
    pub health_cycle_interval: Duration,
    pub sync_cycle_interval: Duration,
    pub route_idle_connection_cap: usize,
    /// Whether to run an immediate sync/health cycle at startup, before the
    /// first interval tick, rather than waiting out the first interval.
    pub sync_on_startup: bool,
    /// Base delay for a failed transport call's exponential backoff
    /// (§7 item 1: base 2s, doubling per attempt).
    pub transport_retry_base: Duration,
    /// Capped retry count for a failed transport call before the error is
    /// surfaced to the caller.
    pub transport_max_retries: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            health_cycle_interval: Duration::from_secs(15),
            sync_cycle_interval: Duration::from_secs(10),
            route_idle_connection_cap: 8,
            sync_on_startup: true,
            transport_retry_base: Duration::from_secs(2),
            transport_max_retries: 3,
        }
    }
}

/// Conflict resolver tuning (§9 Open Question 2 resolution).
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub simultaneity_window: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            simultaneity_window: Duration::from_secs(5),
        }
    }
}
