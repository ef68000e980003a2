//! Host probing subsystem.
//!
//! # Data Flow
//! ```text
//! host query parameter
//!     → with_default_port (host:port)
//!     → tcp.rs (DNS lookup → TCP connect, bounded by timeout)
//!     → ProbeReport { dns_time, tcp_time, reachable }
//!
//! Only for reachable hosts:
//!     → cert.rs (TCP connect → TLS handshake → parse peer chain)
//! ```
//!
//! # Design Decisions
//! - Probes fold every failure into `reachable = false`
//! - Collaborators are traits so the transport can be tested with fakes
//! - TCP time is measured around the connect call itself

pub mod cert;
pub mod tcp;

use std::net::{IpAddr, SocketAddr};

pub use cert::{CertError, CertInfo, CertInspector, TlsCertInspector};
pub use tcp::{Probe, ProbeReport, TcpProbe};

/// Append `default_port` to `host` unless it already names one.
pub fn with_default_port(host: &str, default_port: u16) -> String {
    if host.parse::<SocketAddr>().is_ok() {
        return host.to_string();
    }
    match host.parse::<IpAddr>() {
        Ok(IpAddr::V6(ip)) => format!("[{}]:{}", ip, default_port),
        Ok(IpAddr::V4(ip)) => format!("{}:{}", ip, default_port),
        Err(_) if host.contains(':') => host.to_string(),
        Err(_) => format!("{}:{}", host, default_port),
    }
}

/// Split a target into host and port, falling back to `default_port`.
pub fn split_host_port(target: &str, default_port: u16) -> (String, u16) {
    if let Ok(addr) = target.parse::<SocketAddr>() {
        return (addr.ip().to_string(), addr.port());
    }
    if let Some(inner) = target.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        return (inner.to_string(), default_port);
    }
    if target.parse::<IpAddr>().is_ok() {
        return (target.to_string(), default_port);
    }
    match target.rsplit_once(':') {
        Some((host, port)) => match port.parse::<u16>() {
            Ok(port) => (host.to_string(), port),
            Err(_) => (target.to_string(), default_port),
        },
        None => (target.to_string(), default_port),
    }
}
