//! # Mesh Telemetry
//!
//! Structured logging (`tracing`) and Prometheus metrics for a node
//! process: the sync engine's queue depth and pass duration, the
//! connection manager's route health, the security layer's relay
//! mailbox size.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wm_telemetry::{TelemetryConfig, init_telemetry};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TelemetryConfig::from_env();
//!     let _guard = init_telemetry(config).expect("failed to init telemetry");
//!
//!     // Node runs here; logs and metrics are now being collected.
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `WM_LOG_LEVEL` or `RUST_LOG` | `info` | Log level filter |
//! | `WM_JSON_LOGS` | `false` (`true` in containers) | JSON-formatted logs |
//! | `WM_METRICS_PORT` | `9100` | Prometheus scrape port |

#![warn(missing_docs)]
#![allow(missing_docs)]

mod config;
mod logging;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use logging::StructuredLogger;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, MetricsHandle, CONFLICTS_AUTO_RESOLVED,
    CONFLICTS_QUEUED_FOR_REVIEW, HASH_TREE_BUCKETS_DIRTY, MUTATIONS_INDEXED, RELAY_MAILBOX_SIZE,
    ROUTE_SWITCHES, SYNC_ENTITIES_PULLED, SYNC_ENTITIES_PUSHED, SYNC_PASS_DURATION,
    SYNC_PASSES_FAILED, SYNC_PASSES_STARTED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics registration for a node process.
///
/// Returns a guard that should be held for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics_handle = register_metrics()?;
    tracing_setup::init_tracing(&config)?;

    Ok(TelemetryGuard {
        _metrics: metrics_handle,
    })
}

/// Guard that keeps telemetry active. Drop to log shutdown.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("shutting down telemetry");
    }
}

/// Convenience macro for creating a span with component context.
#[macro_export]
macro_rules! component_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Convenience macro for recording a metric with a value.
#[macro_export]
macro_rules! metric_observe {
    ($metric:expr, $value:expr) => {
        $metric.observe($value)
    };
    ($metric:expr, $labels:expr, $value:expr) => {
        $metric.with_label_values($labels).observe($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "wm-node");
    }
}
