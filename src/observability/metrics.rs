//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define monitor metrics (transitions, tracked hosts, probes, requests)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `monitor_transitions_total` (counter): records by kind (added, up, down, evicted)
//! - `monitor_hosts_tracked` (gauge): current table size
//! - `monitor_event_log_dropped_total` (counter): records lost to a full or closed queue
//! - `monitor_event_sink_errors_total` (counter): sink write failures
//! - `monitor_probes_total` (counter): probes by reachability
//! - `monitor_probe_duration_seconds` (histogram): per phase (dns, tcp)
//! - `monitor_requests_total` (counter): HTTP requests by route, status
//! - `monitor_push_clients` (gauge): connected WebSocket clients
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed (tests, disabled endpoint)

use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::probe::ProbeReport;
use crate::tracker::EventKind;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_transition(kind: EventKind) {
    counter!("monitor_transitions_total", "kind" => kind.as_str()).increment(1);
}

pub fn set_tracked_hosts(count: usize) {
    gauge!("monitor_hosts_tracked").set(count as f64);
}

pub fn record_event_dropped() {
    counter!("monitor_event_log_dropped_total").increment(1);
}

pub fn record_event_sink_error() {
    counter!("monitor_event_sink_errors_total").increment(1);
}

pub fn record_probe(report: &ProbeReport) {
    let reachable = if report.reachable { "true" } else { "false" };
    counter!("monitor_probes_total", "reachable" => reachable).increment(1);
    histogram!("monitor_probe_duration_seconds", "phase" => "dns").record(report.dns_time.as_secs_f64());
    histogram!("monitor_probe_duration_seconds", "phase" => "tcp").record(report.tcp_time.as_secs_f64());
}

pub fn record_request(route: String, status: u16) {
    counter!("monitor_requests_total", "route" => route, "status" => status.to_string()).increment(1);
}

pub fn set_push_clients(count: usize) {
    gauge!("monitor_push_clients").set(count as f64);
}
