//! Production `RouteProbe` backed by a single shared `reqwest::Client`
//! (§4.4 Resource discipline: one pool, IPv4-only dialer, idle-connection
//! cap, per-request timeout).

use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;

use crate::domain::Route;
use crate::ports::{ProbeError, RouteProbe};

/// Appended to a route's `url` to form the probed health path.
const HEALTH_PATH: &str = "/health";

pub struct ReqwestRouteProbe {
    client: Client,
}

impl ReqwestRouteProbe {
    /// Build the shared client pool. Binding the local address to the
    /// unspecified IPv4 address keeps the dialer from racing a slow AAAA
    /// resolution on networks without working IPv6.
    pub fn new(idle_connection_cap: usize) -> Self {
        let client = Client::builder()
            .local_address(Some(Ipv4Addr::UNSPECIFIED.into()))
            .pool_max_idle_per_host(idle_connection_cap)
            .build()
            .expect("reqwest client builds with static configuration");
        Self { client }
    }
}

#[async_trait]
impl RouteProbe for ReqwestRouteProbe {
    async fn probe(&self, route: &Route) -> Result<Duration, ProbeError> {
        let url = format!("{}{}", route.url.trim_end_matches('/'), HEALTH_PATH);
        let started = Instant::now();

        let response = self
            .client
            .get(&url)
            .timeout(route.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProbeError::Timeout(route.url.clone())
                } else {
                    ProbeError::Failed(route.url.clone(), e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(ProbeError::Failed(
                route.url.clone(),
                format!("health path returned {}", response.status()),
            ));
        }

        Ok(started.elapsed())
    }
}
