//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the status monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Reachability probe settings.
    pub probe: ProbeConfig,

    /// Certificate inspection settings.
    pub certs: CertConfig,

    /// Liveness tracking and eviction.
    pub tracker: TrackerConfig,

    /// Event trail destination.
    pub event_log: EventLogConfig,

    /// Push channel settings.
    pub push: PushConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Reachability probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Timeout for DNS resolution and for the TCP connect, in seconds.
    pub timeout_secs: u64,

    /// Port used when the host does not name one.
    pub default_port: u16,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            default_port: 443,
        }
    }
}

/// Certificate inspection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CertConfig {
    /// Timeout for the connect and for the TLS handshake, in seconds.
    pub timeout_secs: u64,
}

impl Default for CertConfig {
    fn default() -> Self {
        Self { timeout_secs: 5 }
    }
}

/// Liveness tracking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Hosts not reported for longer than this are evicted.
    pub inactivity_timeout_secs: u64,

    /// Period of the eviction sweep in milliseconds.
    pub sweep_interval_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout_secs: 5,
            sweep_interval_ms: 1000,
        }
    }
}

/// Event trail configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EventLogConfig {
    /// File receiving JSON-line records. When unset, records go to the
    /// `event_trail` tracing target.
    pub path: Option<String>,

    /// Records queued ahead of the writer before new ones are dropped.
    pub queue_capacity: usize,
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self {
            path: Some("logs/uptime.log".to_string()),
            queue_capacity: 1024,
        }
    }
}

/// Push channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PushConfig {
    /// Notices buffered per client before it lags and skips ahead.
    pub channel_capacity: usize,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: MonitorConfig = toml::from_str(
            r#"
            [tracker]
            inactivity_timeout_secs = 60

            [event_log]
            queue_capacity = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.tracker.inactivity_timeout_secs, 60);
        assert_eq!(config.tracker.sweep_interval_ms, 1000);
        assert_eq!(config.event_log.queue_capacity, 8);
        assert_eq!(config.event_log.path.as_deref(), Some("logs/uptime.log"));
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.probe.default_port, 443);
    }
}
