//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, request timeout, metrics)
//! - Own the monitor's shared state (store, event trail, push hub)
//! - Run the background tasks (event writer, eviction sweeper)
//! - Serve until shutdown, then drain the event trail

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, routing::get, Router};
use tokio::net::TcpListener;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::MonitorConfig;
use crate::events::{EventLog, EventSink, EventWriter, FileSink, TracingSink};
use crate::http::{handlers, request, websocket};
use crate::lifecycle::Shutdown;
use crate::probe::{CertError, CertInspector, Probe, TcpProbe, TlsCertInspector};
use crate::push::PushHub;
use crate::tracker::{EvictionSweeper, StateStore, TransitionEvent};

/// Upper bound on waiting for the event writer after the server stops.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<StateStore>,
    pub probe: Arc<dyn Probe>,
    pub certs: Arc<dyn CertInspector>,
    pub push: PushHub,
    pub default_port: u16,
    /// Fired when the server starts shutting down; closes push connections.
    pub closing: Shutdown,
}

/// HTTP server for the status monitor.
pub struct HttpServer {
    router: Router,
    config: MonitorConfig,
    store: Arc<StateStore>,
    events: EventLog,
    writer: EventWriter,
    closing: Shutdown,
}

impl HttpServer {
    /// Create a server with the network probe and TLS inspector.
    pub fn new(config: MonitorConfig) -> Result<Self, CertError> {
        let probe = Arc::new(TcpProbe::from_config(&config.probe));
        let certs = Arc::new(TlsCertInspector::from_config(
            &config.certs,
            config.probe.default_port,
        )?);
        Ok(Self::with_collaborators(config, probe, certs))
    }

    /// Create a server with the given collaborators and the configured sink.
    pub fn with_collaborators(
        config: MonitorConfig,
        probe: Arc<dyn Probe>,
        certs: Arc<dyn CertInspector>,
    ) -> Self {
        let sink: Box<dyn EventSink> = match &config.event_log.path {
            Some(path) => Box::new(FileSink::new(path)),
            None => Box::new(TracingSink),
        };
        Self::with_parts(config, probe, certs, sink)
    }

    pub fn with_parts(
        config: MonitorConfig,
        probe: Arc<dyn Probe>,
        certs: Arc<dyn CertInspector>,
        sink: Box<dyn EventSink>,
    ) -> Self {
        let (events, writer) = EventLog::with_writer(config.event_log.queue_capacity, sink);
        let push = PushHub::new(config.push.channel_capacity);
        let store = Arc::new(StateStore::new(events.clone()).with_push(push.clone()));
        let closing = Shutdown::new();

        let state = AppState {
            store: store.clone(),
            probe,
            certs,
            push,
            default_port: config.probe.default_port,
            closing: closing.clone(),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            store,
            events,
            writer,
            closing,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &MonitorConfig, state: AppState) -> Router {
        Router::new()
            .route("/up", get(handlers::check_up))
            .route("/certinfo", get(handlers::cert_info))
            .route("/status", get(handlers::status))
            .route("/ws", get(websocket::push_updates))
            .route_layer(middleware::from_fn(request::track_requests))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http().make_span_with(request::request_span))
            .layer(request::propagate_request_id_layer())
            .layer(request::set_request_id_layer())
    }

    /// Router for in-process use (no background tasks).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn store(&self) -> Arc<StateStore> {
        self.store.clone()
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires.
    ///
    /// Starts the event writer and the eviction sweeper, then after the HTTP
    /// server has drained stops the sweeper and waits (bounded) for the
    /// remaining records to reach the sink.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let HttpServer {
            router,
            config,
            store,
            events,
            writer,
            closing,
        } = self;

        let addr = listener.local_addr()?;
        let writer_task = tokio::spawn(writer.run());

        let sweeper = EvictionSweeper::from_config(store.clone(), &config.tracker);
        let sweeper_task = tokio::spawn(sweeper.run(shutdown.subscribe()));

        tracing::info!(address = %addr, "HTTP server listening");
        events.record(TransitionEvent::lifecycle(format!("HTTP server listening on {}", addr)));

        let signal = shutdown.clone();
        let signal_closing = closing.clone();
        let signal_events = events.clone();
        let served = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                signal.wait().await;
                tracing::info!("Shutting down server");
                signal_events.record(TransitionEvent::lifecycle("Shutting down server"));
                // Upgraded connections are not tracked by the graceful shutdown.
                signal_closing.trigger();
            })
            .await;

        if let Err(e) = &served {
            tracing::error!(error = %e, "HTTP server failed");
        }

        closing.trigger();
        shutdown.trigger();
        if let Err(e) = sweeper_task.await {
            tracing::error!(error = %e, "Eviction sweeper task failed");
        }

        tracing::info!("Server exiting");
        events.record(TransitionEvent::lifecycle("Server exiting"));
        drop(events);
        drop(store);

        match tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer_task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Event writer task failed"),
            Err(_) => tracing::warn!("Event writer did not drain before the deadline"),
        }

        served
    }
}
