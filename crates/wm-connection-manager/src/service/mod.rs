//! Driving API: per-peer route lists, the periodic health cycle, and the
//! cached active-route lookup the sync engine calls on every peer cycle.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};
use wm_shared_bus::{EventPublisher, MeshEvent};
use wm_telemetry::ROUTE_SWITCHES;

use crate::domain::{select_route, ConnectionManagerError, Route, RouteState};
use crate::ports::{RouteProbe, TimeSource};

/// Tracks routes and the cached current route for every known peer.
///
/// Generic over its probe, clock and event-bus ports so the host wires in
/// whichever adapters fit its deployment, matching the rest of this
/// workspace's port-generic driving services.
pub struct ConnectionManager<P, T, B> {
    probe: Arc<P>,
    clock: Arc<T>,
    event_bus: Arc<B>,
    routes: RwLock<HashMap<String, Vec<RouteState>>>,
    current: RwLock<HashMap<String, String>>,
}

impl<P, T, B> ConnectionManager<P, T, B>
where
    P: RouteProbe,
    T: TimeSource,
    B: EventPublisher,
{
    #[must_use]
    pub fn new(probe: Arc<P>, clock: Arc<T>, event_bus: Arc<B>) -> Self {
        Self {
            probe,
            clock,
            event_bus,
            routes: RwLock::new(HashMap::new()),
            current: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the candidate route list for a peer (e.g. on handshake).
    pub fn configure_peer(&self, peer_instance_id: impl Into<String>, routes: Vec<Route>) {
        self.routes.write().insert(
            peer_instance_id.into(),
            routes.into_iter().map(RouteState::new).collect(),
        );
    }

    /// The cached active route for a peer, without probing. This is the
    /// read path the sync engine takes on every cycle (§9 singleton
    /// discipline: readers are hot, writers are rare).
    #[must_use]
    pub fn active_route(&self, peer_instance_id: &str) -> Option<String> {
        self.current.read().get(peer_instance_id).cloned()
    }

    /// Probe every route for every configured peer, then re-run the
    /// selection rule and emit a `RouteSwitched` event for each peer whose
    /// active route changed.
    pub async fn run_health_cycle(&self) {
        let peer_ids: Vec<String> = self.routes.read().keys().cloned().collect();

        for peer_instance_id in peer_ids {
            self.probe_peer_routes(&peer_instance_id).await;
            self.reselect_peer(&peer_instance_id).await;
        }
    }

    async fn probe_peer_routes(&self, peer_instance_id: &str) {
        let routes: Vec<Route> = {
            let guard = self.routes.read();
            match guard.get(peer_instance_id) {
                Some(states) => states.iter().map(|s| s.route.clone()).collect(),
                None => return,
            }
        };

        for route in routes {
            let outcome = self.probe.probe(&route).await;
            let at = self.clock.now();
            let mut guard = self.routes.write();
            let Some(states) = guard.get_mut(peer_instance_id) else {
                return;
            };
            let Some(state) = states.iter_mut().find(|s| s.route.url == route.url) else {
                continue;
            };
            match outcome {
                Ok(latency) => state.status.record_success(at, latency),
                Err(error) => {
                    warn!(peer_instance_id, route = %route.url, %error, "route probe failed");
                    state.status.record_failure(at);
                }
            }
        }
    }

    async fn reselect_peer(&self, peer_instance_id: &str) {
        let current = self.current.read().get(peer_instance_id).cloned();
        let outcome = {
            let guard = self.routes.read();
            let Some(states) = guard.get(peer_instance_id) else {
                return;
            };
            select_route(states, current.as_deref())
        };

        match (&outcome.chosen, &outcome.switch) {
            (Some(chosen), Some(reason)) => {
                info!(
                    peer_instance_id,
                    from = ?current,
                    to = %chosen,
                    reason = reason.as_str(),
                    "active route switched"
                );
                ROUTE_SWITCHES.with_label_values(&[reason.as_str()]).inc();
                self.event_bus
                    .publish(MeshEvent::RouteSwitched {
                        peer_instance_id: peer_instance_id.to_string(),
                        from: current,
                        to: chosen.clone(),
                        reason: reason.as_str().to_string(),
                    })
                    .await;
                self.current
                    .write()
                    .insert(peer_instance_id.to_string(), chosen.clone());
            }
            (Some(chosen), None) => {
                self.current
                    .write()
                    .insert(peer_instance_id.to_string(), chosen.clone());
            }
            (None, Some(reason)) => {
                warn!(peer_instance_id, reason = reason.as_str(), "peer has no usable route");
                ROUTE_SWITCHES.with_label_values(&[reason.as_str()]).inc();
                self.event_bus
                    .publish(MeshEvent::RouteSwitched {
                        peer_instance_id: peer_instance_id.to_string(),
                        from: current,
                        to: String::new(),
                        reason: reason.as_str().to_string(),
                    })
                    .await;
                self.current.write().remove(peer_instance_id);
            }
            (None, None) => {}
        }
    }

    /// The route a caller should use right now, erroring rather than
    /// silently skipping if the peer is offline or unknown.
    pub fn require_route(&self, peer_instance_id: &str) -> Result<String, ConnectionManagerError> {
        if !self.routes.read().contains_key(peer_instance_id) {
            return Err(ConnectionManagerError::UnknownPeer(peer_instance_id.to_string()));
        }
        self.active_route(peer_instance_id)
            .ok_or_else(|| ConnectionManagerError::PeerOffline(peer_instance_id.to_string()))
    }
}
