//! Pure route-selection rule (§4.4 Selection rule). No I/O: takes the
//! already-probed route states and the cached current route, and decides.

use super::route::RouteState;

/// Why the active route changed, mirrored onto `wm_shared_bus::MeshEvent::RouteSwitched`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSwitchReason {
    /// A higher-priority route came back up and is promoted on the next cycle.
    RouteAvailable,
    /// The primary route specifically came back after being down.
    PrimaryRestored,
    /// The route previously in use started failing probes.
    CurrentRouteFailed,
    /// Every candidate route is currently failing.
    AllRoutesUnavailable,
}

impl RouteSwitchReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RouteAvailable => "route_available",
            Self::PrimaryRestored => "primary_restored",
            Self::CurrentRouteFailed => "current_route_failed",
            Self::AllRoutesUnavailable => "all_routes_unavailable",
        }
    }
}

/// The result of running the selection rule once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOutcome {
    /// The chosen route's url, or `None` if every route is down.
    pub chosen: Option<String>,
    /// Set only when `chosen` differs from the route that was active before
    /// this call.
    pub switch: Option<RouteSwitchReason>,
}

/// Run the three-step selection rule over `routes` (assumed already probed
/// this health cycle), given the url of the route currently in use, if any.
///
/// Switches never happen mid-request: the caller only invokes this between
/// health cycles, so a `RouteAvailable`/`PrimaryRestored` outcome here always
/// reflects the *next* route a fresh request should use.
#[must_use]
pub fn select_route(routes: &[RouteState], current: Option<&str>) -> SelectionOutcome {
    let mut by_priority: Vec<&RouteState> = routes.iter().collect();
    by_priority.sort_by_key(|state| state.route.priority);

    // Step 1: first route whose last probe succeeded, in priority order.
    let chosen = by_priority.iter().find(|state| state.status.available);

    let Some(chosen) = chosen else {
        // Step 3: nothing succeeded.
        return SelectionOutcome {
            chosen: None,
            switch: current.map(|_| RouteSwitchReason::AllRoutesUnavailable),
        };
    };

    if Some(chosen.route.url.as_str()) == current {
        return SelectionOutcome {
            chosen: Some(chosen.route.url.clone()),
            switch: None,
        };
    }

    // Step 2: the chosen route differs from the cached current one.
    let current_is_down = current
        .and_then(|url| routes.iter().find(|s| s.route.url == url))
        .map(|s| !s.status.available)
        .unwrap_or(false);

    let reason = if current_is_down {
        RouteSwitchReason::CurrentRouteFailed
    } else if chosen.route.kind == super::route::RouteKind::Primary {
        RouteSwitchReason::PrimaryRestored
    } else {
        RouteSwitchReason::RouteAvailable
    };

    SelectionOutcome {
        chosen: Some(chosen.route.url.clone()),
        switch: Some(reason),
    }
}

#[cfg(test)]
mod tests {
    use super::super::route::{Route, RouteKind, RouteStatus};
    use super::*;
    use std::time::Duration;

    fn state(url: &str, kind: RouteKind, priority: u8, available: bool) -> RouteState {
        RouteState {
            route: Route::new(url, kind, Duration::from_secs(2), priority),
            status: RouteStatus {
                available,
                ..RouteStatus::default()
            },
        }
    }

    #[test]
    fn no_current_route_and_primary_up_picks_primary_without_switch_reason() {
        let routes = vec![state("primary", RouteKind::Primary, 0, true)];
        let outcome = select_route(&routes, None);
        assert_eq!(outcome.chosen.as_deref(), Some("primary"));
        assert!(outcome.switch.is_none());
    }

    #[test]
    fn picks_lowest_priority_available_route() {
        let routes = vec![
            state("primary", RouteKind::Primary, 0, false),
            state("fallback", RouteKind::Fallback, 1, true),
            state("remote", RouteKind::Remote, 2, true),
        ];
        let outcome = select_route(&routes, Some("fallback"));
        assert_eq!(outcome.chosen.as_deref(), Some("fallback"));
        assert!(outcome.switch.is_none());
    }

    #[test]
    fn current_route_failing_triggers_current_route_failed() {
        let routes = vec![
            state("primary", RouteKind::Primary, 0, false),
            state("fallback", RouteKind::Fallback, 1, true),
        ];
        let outcome = select_route(&routes, Some("primary"));
        assert_eq!(outcome.chosen.as_deref(), Some("fallback"));
        assert_eq!(outcome.switch, Some(RouteSwitchReason::CurrentRouteFailed));
    }

    #[test]
    fn primary_back_up_triggers_primary_restored() {
        let routes = vec![
            state("primary", RouteKind::Primary, 0, true),
            state("fallback", RouteKind::Fallback, 1, true),
        ];
        let outcome = select_route(&routes, Some("fallback"));
        assert_eq!(outcome.chosen.as_deref(), Some("primary"));
        assert_eq!(outcome.switch, Some(RouteSwitchReason::PrimaryRestored));
    }

    #[test]
    fn all_routes_down_with_prior_current_reports_all_unavailable() {
        let routes = vec![
            state("primary", RouteKind::Primary, 0, false),
            state("fallback", RouteKind::Fallback, 1, false),
        ];
        let outcome = select_route(&routes, Some("primary"));
        assert!(outcome.chosen.is_none());
        assert_eq!(outcome.switch, Some(RouteSwitchReason::AllRoutesUnavailable));
    }

    #[test]
    fn all_routes_down_with_no_prior_current_reports_no_switch() {
        let routes = vec![state("primary", RouteKind::Primary, 0, false)];
        let outcome = select_route(&routes, None);
        assert!(outcome.chosen.is_none());
        assert!(outcome.switch.is_none());
    }
}
