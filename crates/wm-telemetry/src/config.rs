//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for a node's logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line.
    pub service_name: String,

    /// This node's instance id, attached to every log line.
    pub instance_id: String,

    /// Log level filter (trace, debug, info, warn, error).
    pub log_level: String,

    /// Whether to enable console output (for development).
    pub console_output: bool,

    /// Whether to enable JSON-formatted logs.
    pub json_logs: bool,

    /// Prometheus metrics port.
    pub metrics_port: u16,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "wm-node".to_string(),
            instance_id: "unset".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_port: 9100,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `WM_SERVICE_NAME`: service name (default: `wm-node`)
    /// - `WM_INSTANCE_ID`: this node's instance id (default: `unset`)
    /// - `WM_LOG_LEVEL` or `RUST_LOG`: log level (default: `info`)
    /// - `WM_CONSOLE_OUTPUT`: enable console output (default: `true`)
    /// - `WM_JSON_LOGS`: enable JSON logs (default: `false` in dev, `true` in containers)
    /// - `WM_METRICS_PORT`: Prometheus metrics port (default: `9100`)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("WM_SERVICE_NAME").unwrap_or_else(|_| "wm-node".to_string()),

            instance_id: env::var("WM_INSTANCE_ID").unwrap_or_else(|_| "unset".to_string()),

            log_level: env::var("WM_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("WM_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("WM_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            metrics_port: env::var("WM_METRICS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(9100),
        }
    }

    /// Create configuration for a named node instance.
    pub fn for_instance(instance_id: &str) -> Self {
        let mut config = Self::from_env();
        config.instance_id = instance_id.to_string();
        config
    }

    /// Get the full service name including instance id.
    pub fn full_service_name(&self) -> String {
        if self.instance_id == "unset" {
            self.service_name.clone()
        } else {
            format!("{}-{}", self.service_name, self.instance_id)
        }
    }
}
