//! Prometheus metrics for mesh node components.
//!
//! All metrics follow the naming convention: `wm_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., sync_passes_started_total)
//! - **Gauge**: Value that can go up or down (e.g., relay_mailbox_size)
//! - **Histogram**: Distribution of values (e.g., sync_pass_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, Histogram, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // MUTATION INTERCEPTOR
    // =========================================================================

    /// Total mutations indexed (checksum rows recomputed).
    pub static ref MUTATIONS_INDEXED: Counter = Counter::new(
        "wm_mutation_interceptor_mutations_indexed_total",
        "Total number of mutations intercepted and checksummed"
    ).expect("metric creation failed");

    /// Hash-tree buckets currently marked dirty, awaiting recompute.
    pub static ref HASH_TREE_BUCKETS_DIRTY: Gauge = Gauge::new(
        "wm_hash_tree_buckets_dirty",
        "Number of buckets with a pending hash recompute"
    ).expect("metric creation failed");

    // =========================================================================
    // SYNC ENGINE
    // =========================================================================

    /// Sync passes started.
    pub static ref SYNC_PASSES_STARTED: Counter = Counter::new(
        "wm_sync_engine_passes_started_total",
        "Total sync passes started against any peer"
    ).expect("metric creation failed");

    /// Sync passes that failed.
    pub static ref SYNC_PASSES_FAILED: CounterVec = CounterVec::new(
        Opts::new("wm_sync_engine_passes_failed_total", "Total sync passes that failed"),
        &["reason"]
    ).expect("metric creation failed");

    /// Sync pass duration.
    pub static ref SYNC_PASS_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "wm_sync_engine_pass_duration_seconds",
            "Time spent running a sync pass against one peer"
        ).buckets(exponential_buckets(0.01, 2.0, 14).unwrap())
    ).expect("metric creation failed");

    /// Entities pulled from peers.
    pub static ref SYNC_ENTITIES_PULLED: Counter = Counter::new(
        "wm_sync_engine_entities_pulled_total",
        "Total entities pulled from peers during sync"
    ).expect("metric creation failed");

    /// Entities pushed to peers.
    pub static ref SYNC_ENTITIES_PUSHED: Counter = Counter::new(
        "wm_sync_engine_entities_pushed_total",
        "Total entities pushed to peers during sync"
    ).expect("metric creation failed");

    // =========================================================================
    // CONNECTION MANAGER
    // =========================================================================

    /// Route switches (active route changed for a peer).
    pub static ref ROUTE_SWITCHES: CounterVec = CounterVec::new(
        Opts::new("wm_connection_manager_route_switches_total", "Active-route changes by reason"),
        &["reason"]
    ).expect("metric creation failed");

    // =========================================================================
    // CONFLICT RESOLVER
    // =========================================================================

    /// Conflicts resolved automatically.
    pub static ref CONFLICTS_AUTO_RESOLVED: CounterVec = CounterVec::new(
        Opts::new("wm_conflict_resolver_auto_resolved_total", "Conflicts resolved without manual review"),
        &["rule"]  // rule: physical_override/vector_clock/priority/wall_clock/instance_id
    ).expect("metric creation failed");

    /// Conflicts queued for manual review.
    pub static ref CONFLICTS_QUEUED_FOR_REVIEW: Counter = Counter::new(
        "wm_conflict_resolver_queued_for_review_total",
        "Total conflicts that could not be resolved automatically"
    ).expect("metric creation failed");

    // =========================================================================
    // SECURITY LAYER
    // =========================================================================

    /// Packets currently held in the blind relay's mailbox.
    pub static ref RELAY_MAILBOX_SIZE: Gauge = Gauge::new(
        "wm_security_layer_relay_mailbox_size",
        "Number of encrypted packets currently held in the relay mailbox"
    ).expect("metric creation failed");

    // =========================================================================
    // ERRORS
    // =========================================================================

    /// Errors by component and type.
    pub static ref COMPONENT_ERRORS: CounterVec = CounterVec::new(
        Opts::new("wm_component_errors_total", "Errors by component and type"),
        &["component", "error_type"]
    ).expect("metric creation failed");
}

/// Handle for the metrics registry.
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(MUTATIONS_INDEXED.clone()),
        Box::new(HASH_TREE_BUCKETS_DIRTY.clone()),
        Box::new(SYNC_PASSES_STARTED.clone()),
        Box::new(SYNC_PASSES_FAILED.clone()),
        Box::new(SYNC_PASS_DURATION.clone()),
        Box::new(SYNC_ENTITIES_PULLED.clone()),
        Box::new(SYNC_ENTITIES_PUSHED.clone()),
        Box::new(ROUTE_SWITCHES.clone()),
        Box::new(CONFLICTS_AUTO_RESOLVED.clone()),
        Box::new(CONFLICTS_QUEUED_FOR_REVIEW.clone()),
        Box::new(RELAY_MAILBOX_SIZE.clone()),
        Box::new(COMPONENT_ERRORS.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_metrics() {
        // May fail if already registered from another test in this binary,
        // which is fine — the registry is a process-wide singleton.
        let _ = register_metrics();
    }

    #[test]
    fn test_counter_increment() {
        MUTATIONS_INDEXED.inc();
        assert!(MUTATIONS_INDEXED.get() >= 1.0);
    }

    #[test]
    fn test_gauge_set() {
        RELAY_MAILBOX_SIZE.set(42.0);
        assert_eq!(RELAY_MAILBOX_SIZE.get(), 42.0);
    }

    #[test]
    fn test_histogram_timer() {
        let _timer = HistogramTimer::new(&SYNC_PASS_DURATION);
        std::thread::sleep(std::time::Duration::from_millis(1));
        // Timer observes on drop
    }
}
