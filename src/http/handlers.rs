//! Request handlers for the HTTP API.

use std::time::Duration;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::probe::{with_default_port, CertInfo, ProbeReport};
use crate::tracker::ServiceState;

#[derive(Debug, Deserialize)]
pub struct HostQuery {
    pub host: Option<String>,
}

impl HostQuery {
    fn required(self) -> Result<String, ApiError> {
        match self.host.map(|h| h.trim().to_string()) {
            Some(host) if !host.is_empty() => Ok(host),
            _ => Err(ApiError::MissingHost),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpResponse {
    pub reachable: bool,
    /// Human-readable, e.g. "1.52ms".
    pub dns_resolution_time: String,
    pub tcp_connection_time: String,
    pub dns_resolution_time_ms: f64,
    pub tcp_connection_time_ms: f64,
}

impl From<ProbeReport> for UpResponse {
    fn from(report: ProbeReport) -> Self {
        Self {
            reachable: report.reachable,
            dns_resolution_time: format!("{:?}", report.dns_time),
            tcp_connection_time: format!("{:?}", report.tcp_time),
            dns_resolution_time_ms: millis(report.dns_time),
            tcp_connection_time_ms: millis(report.tcp_time),
        }
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub booted_at: DateTime<Utc>,
    pub push_clients: usize,
    pub hosts: Vec<ServiceState>,
}

/// `GET /up?host=H` — probe the host and record the result.
///
/// The probe and the state update run on their own task: a client that
/// disconnects does not cancel them.
pub async fn check_up(
    State(state): State<AppState>,
    query: Result<Query<HostQuery>, QueryRejection>,
) -> Result<Json<UpResponse>, ApiError> {
    let Query(query) = query?;
    let host = query.required()?;
    let target = with_default_port(&host, state.default_port);

    tracing::debug!(host = %host, probe_target = %target, "Liveness check");

    let probe = state.probe.clone();
    let store = state.store.clone();
    let report = tokio::spawn(async move {
        let report = probe.probe(&target).await;
        store.update(&host, report.reachable);
        report
    })
    .await
    .map_err(|e| ApiError::Internal(format!("probe task failed: {}", e)))?;

    Ok(Json(UpResponse::from(report)))
}

/// `GET /certinfo?host=H` — certificate chain of a reachable host.
///
/// Does not touch the liveness table.
pub async fn cert_info(
    State(state): State<AppState>,
    query: Result<Query<HostQuery>, QueryRejection>,
) -> Result<Json<Vec<CertInfo>>, ApiError> {
    let Query(query) = query?;
    let host = query.required()?;
    let target = with_default_port(&host, state.default_port);

    let report = state.probe.probe(&target).await;
    if !report.reachable {
        return Err(ApiError::Unreachable);
    }

    let certs = state.certs.inspect(&target).await?;
    Ok(Json(certs))
}

/// `GET /status` — snapshot of every tracked host.
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        booted_at: state.store.booted_at(),
        push_clients: state.push.client_count(),
        hosts: state.store.snapshot(),
    })
}
