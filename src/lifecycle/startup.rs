//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration (file, then command-line overrides)
//! - Install the metrics recorder when enabled
//! - Build the server and its collaborators
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener binds last (traffic only when ready)

use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{load_config, validate_config, ConfigError, MonitorConfig};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::probe::CertError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to initialize logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("Failed to start metrics endpoint: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("Invalid {field} '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("Failed to build certificate inspector: {0}")]
    Certs(#[from] CertError),

    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

/// Resolve the effective configuration.
///
/// Defaults apply when no file is given; `bind_override` replaces the
/// configured listener address and is validated like the rest.
pub fn load(
    config_path: Option<&Path>,
    bind_override: Option<String>,
) -> Result<MonitorConfig, StartupError> {
    let mut config = match config_path {
        Some(path) => load_config(path)?,
        None => MonitorConfig::default(),
    };

    if let Some(bind) = bind_override {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    Ok(config)
}

/// Bring the monitor up and serve until `shutdown` fires.
pub async fn start(config: MonitorConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        inactivity_timeout_secs = config.tracker.inactivity_timeout_secs,
        sweep_interval_ms = config.tracker.sweep_interval_ms,
        event_log = config.event_log.path.as_deref().unwrap_or("<tracing>"),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse().map_err(|_| {
            StartupError::InvalidAddress {
                field: "observability.metrics_address",
                value: config.observability.metrics_address.clone(),
            }
        })?;
        metrics::init_metrics(addr)?;
    }

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: bind_address,
            source,
        })?;

    server.run(listener, shutdown).await.map_err(StartupError::Serve)
}
