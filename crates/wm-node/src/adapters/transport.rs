//! Production `MeshTransport` over the peer HTTP surface (§6), grounded
//! on `wm-connection-manager::adapters::health::ReqwestRouteProbe`'s
//! shared-client-pool discipline: one `reqwest::Client`, IPv4-bound, a
//! capped idle-connection pool.
//!
//! Every round trip is signed with a fresh bearer token (§6); the base
//! URL for a peer is resolved through the connection manager's cached
//! active route rather than the roster's raw advertisement, so an
//! unhealthy primary route doesn't wedge every sync pass.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;
use wm_connection_manager::ConnectionManager;
use wm_connection_manager::{RouteProbe, TimeSource};
use wm_shared_bus::EventPublisher;
use wm_shared_types::entities::NodeRole;
use wm_shared_types::{EntityKey, EntityType};
use wm_sync_engine::ports::{MeshTransport, TransportError};
use wm_sync_engine::SyncRecord;

use crate::http::wire::{BucketViewDto, PullRequest, PullResponse, PushRequest, RootViewDto, SyncRecordDto};
use crate::security::issue_bearer;

pub struct ReqwestMeshTransport<P, T, B> {
    client: Client,
    connections: Arc<ConnectionManager<P, T, B>>,
    roster_base_urls: Arc<dyn Fn(&str) -> Option<String> + Send + Sync>,
    instance_id: String,
    role: NodeRole,
    mesh_secret: Vec<u8>,
    retry_base: Duration,
    max_retries: u32,
}

impl<P, T, B> ReqwestMeshTransport<P, T, B>
where
    P: RouteProbe,
    T: TimeSource,
    B: EventPublisher,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        idle_connection_cap: usize,
        connections: Arc<ConnectionManager<P, T, B>>,
        roster_base_urls: Arc<dyn Fn(&str) -> Option<String> + Send + Sync>,
        instance_id: impl Into<String>,
        role: NodeRole,
        mesh_secret: Vec<u8>,
        retry_base: Duration,
        max_retries: u32,
    ) -> Self {
        let client = Client::builder()
            .local_address(Some(Ipv4Addr::UNSPECIFIED.into()))
            .pool_max_idle_per_host(idle_connection_cap)
            .build()
            .expect("reqwest client builds with static configuration");
        Self {
            client,
            connections,
            roster_base_urls,
            instance_id: instance_id.into(),
            role,
            mesh_secret,
            retry_base,
            max_retries,
        }
    }

    /// The cached active route for a peer if the connection manager has
    /// one, falling back to the roster's advertised base URL.
    fn base_url(&self, peer_instance_id: &str) -> Result<String, TransportError> {
        if let Some(route) = self.connections.active_route(peer_instance_id) {
            return Ok(route);
        }
        (self.roster_base_urls)(peer_instance_id)
            .ok_or_else(|| TransportError::Unreachable(peer_instance_id.to_string()))
    }

    fn bearer(&self) -> String {
        issue_bearer(&self.instance_id, self.role, "", 0, &self.mesh_secret)
    }

    /// Runs a transport call once, then retries up to `max_retries` times
    /// on `TransportError::Unreachable` with exponential backoff (§7 item
    /// 1: base delay doubling per attempt). `Malformed` is never retried —
    /// a bad payload won't fix itself.
    async fn with_retry<'a, F, Fut, V>(&'a self, peer_instance_id: &str, mut attempt: F) -> Result<V, TransportError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<V, TransportError>> + 'a,
    {
        let mut delay = self.retry_base;
        let mut last_error = match attempt().await {
            Ok(value) => return Ok(value),
            Err(TransportError::Malformed(reason)) => return Err(TransportError::Malformed(reason)),
            Err(error) => error,
        };

        for attempt_number in 1..=self.max_retries {
            warn!(%peer_instance_id, error = %last_error, attempt_number, "transport call failed, retrying");
            tokio::time::sleep(delay).await;
            delay *= 2;

            match attempt().await {
                Ok(value) => return Ok(value),
                Err(TransportError::Malformed(reason)) => return Err(TransportError::Malformed(reason)),
                Err(error) => last_error = error,
            }
        }

        Err(last_error)
    }
}

fn unreachable(peer_instance_id: &str, error: impl std::fmt::Display) -> TransportError {
    TransportError::Unreachable(format!("{peer_instance_id}: {error}"))
}

fn malformed(error: impl std::fmt::Display) -> TransportError {
    TransportError::Malformed(error.to_string())
}

#[async_trait]
impl<P, T, B> MeshTransport for ReqwestMeshTransport<P, T, B>
where
    P: RouteProbe,
    T: TimeSource,
    B: EventPublisher,
{
    async fn fetch_root(
        &self,
        peer_instance_id: &str,
        entity_type: EntityType,
    ) -> Result<wm_hash_tree::RootView, TransportError> {
        let url = format!("{}/mesh/merkle/{}", self.base_url(peer_instance_id)?, entity_type.as_wire_str());
        let dto: RootViewDto = self
            .with_retry(peer_instance_id, || async {
                let response = self
                    .client
                    .get(&url)
                    .bearer_auth(self.bearer())
                    .send()
                    .await
                    .map_err(|e| unreachable(peer_instance_id, e))?;
                response.json().await.map_err(malformed)
            })
            .await?;
        Ok(wm_hash_tree::RootView {
            root_hash: dto.root_hash,
            buckets: dto
                .buckets
                .into_iter()
                .filter_map(|(bucket, hash)| bucket.chars().next().map(|c| (c, hash)))
                .collect(),
        })
    }

    async fn fetch_bucket(
        &self,
        peer_instance_id: &str,
        entity_type: EntityType,
        bucket: char,
    ) -> Result<wm_hash_tree::BucketView, TransportError> {
        let url = format!(
            "{}/mesh/merkle/{}/{}",
            self.base_url(peer_instance_id)?,
            entity_type.as_wire_str(),
            bucket
        );
        let dto: BucketViewDto = self
            .with_retry(peer_instance_id, || async {
                let response = self
                    .client
                    .get(&url)
                    .bearer_auth(self.bearer())
                    .send()
                    .await
                    .map_err(|e| unreachable(peer_instance_id, e))?;
                response.json().await.map_err(malformed)
            })
            .await?;
        Ok(wm_hash_tree::BucketView {
            bucket_hash: dto.bucket_hash,
            entities: dto.entities,
        })
    }

    async fn pull(
        &self,
        peer_instance_id: &str,
        entity_type: EntityType,
        entity_ids: &[EntityKey],
    ) -> Result<Vec<SyncRecord>, TransportError> {
        let url = format!("{}/mesh/pull", self.base_url(peer_instance_id)?);
        let body = PullRequest {
            entity_type,
            entity_ids: entity_ids.iter().map(|k| k.entity_id.clone()).collect(),
        };
        let parsed: PullResponse = self
            .with_retry(peer_instance_id, || async {
                let response = self
                    .client
                    .post(&url)
                    .bearer_auth(self.bearer())
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| unreachable(peer_instance_id, e))?;
                response.json().await.map_err(malformed)
            })
            .await?;
        Ok(parsed.records.into_iter().map(SyncRecord::from).collect())
    }

    async fn push(
        &self,
        peer_instance_id: &str,
        entity_type: EntityType,
        records: Vec<SyncRecord>,
    ) -> Result<(), TransportError> {
        let url = format!("{}/mesh/push", self.base_url(peer_instance_id)?);
        let body = PushRequest {
            entity_type,
            records: records.into_iter().map(SyncRecordDto::from).collect(),
        };
        self.with_retry(peer_instance_id, || async {
            self.client
                .post(&url)
                .bearer_auth(self.bearer())
                .json(&body)
                .send()
                .await
                .map_err(|e| unreachable(peer_instance_id, e))?
                .error_for_status()
                .map_err(|e| unreachable(peer_instance_id, e))?;
            Ok(())
        })
        .await
    }
}
