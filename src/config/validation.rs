//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, capacities > 0, addresses parse)
//! - Keep the request timeout above the longest probe path
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MonitorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::MonitorConfig;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("timeouts.request_secs ({request}) must exceed probe.timeout_secs + certs.timeout_secs ({probe_path})")]
    RequestTimeoutTooShort { request: u64, probe_path: u64 },

    #[error("observability.log_format must be \"pretty\" or \"json\", got '{0}'")]
    LogFormat(String),

    #[error("event_log.path must not be empty")]
    EmptyLogPath,
}

pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let non_zero = [
        ("probe.timeout_secs", config.probe.timeout_secs),
        ("probe.default_port", u64::from(config.probe.default_port)),
        ("certs.timeout_secs", config.certs.timeout_secs),
        ("tracker.inactivity_timeout_secs", config.tracker.inactivity_timeout_secs),
        ("tracker.sweep_interval_ms", config.tracker.sweep_interval_ms),
        ("event_log.queue_capacity", config.event_log.queue_capacity as u64),
        ("push.channel_capacity", config.push.channel_capacity as u64),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ];
    for (field, value) in non_zero {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    let probe_path = config.probe.timeout_secs.saturating_add(config.certs.timeout_secs);
    if config.timeouts.request_secs <= probe_path {
        errors.push(ValidationError::RequestTimeoutTooShort {
            request: config.timeouts.request_secs,
            probe_path,
        });
    }

    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::LogFormat(config.observability.log_format.clone()));
    }

    if matches!(config.event_log.path.as_deref(), Some(p) if p.trim().is_empty()) {
        errors.push(ValidationError::EmptyLogPath);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
