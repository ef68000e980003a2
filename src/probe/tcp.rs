//! DNS + TCP reachability probe.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::net::{lookup_host, TcpStream};
use tokio::time;

use crate::config::ProbeConfig;
use crate::observability::metrics;
use crate::probe::split_host_port;

/// Result of a single reachability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProbeReport {
    /// Time spent resolving the host name.
    pub dns_time: Duration,
    /// Time spent establishing the TCP connection.
    pub tcp_time: Duration,
    pub reachable: bool,
}

impl ProbeReport {
    fn unreachable(dns_time: Duration, tcp_time: Duration) -> Self {
        Self {
            dns_time,
            tcp_time,
            reachable: false,
        }
    }
}

/// Reachability check for a `host:port` target.
///
/// Implementations never fail: any resolution or connection problem is
/// reported as `reachable == false`.
pub trait Probe: Send + Sync {
    fn probe<'a>(&'a self, target: &'a str) -> BoxFuture<'a, ProbeReport>;
}

/// Resolves the target and opens (then closes) a TCP connection to the
/// first resolved address.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    timeout: Duration,
    default_port: u16,
}

impl TcpProbe {
    pub fn new(timeout: Duration, default_port: u16) -> Self {
        Self { timeout, default_port }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(Duration::from_secs(config.timeout_secs), config.default_port)
    }

    async fn resolve(&self, host: &str, port: u16) -> Option<SocketAddr> {
        match time::timeout(self.timeout, lookup_host((host, port))).await {
            Ok(Ok(mut addrs)) => addrs.next(),
            Ok(Err(e)) => {
                tracing::debug!(host = %host, error = %e, "DNS resolution failed");
                None
            }
            Err(_) => {
                tracing::debug!(host = %host, "DNS resolution timed out");
                None
            }
        }
    }

    async fn run(&self, target: &str) -> ProbeReport {
        let (host, port) = split_host_port(target, self.default_port);

        let dns_start = Instant::now();
        let resolved = self.resolve(&host, port).await;
        let dns_time = dns_start.elapsed();

        let addr = match resolved {
            Some(addr) => addr,
            None => return ProbeReport::unreachable(dns_time, Duration::ZERO),
        };

        let tcp_start = Instant::now();
        let connected = time::timeout(self.timeout, TcpStream::connect(addr)).await;
        let tcp_time = tcp_start.elapsed();

        match connected {
            Ok(Ok(_stream)) => ProbeReport {
                dns_time,
                tcp_time,
                reachable: true,
            },
            Ok(Err(e)) => {
                tracing::debug!(probe_target = %target, addr = %addr, error = %e, "TCP connect failed");
                ProbeReport::unreachable(dns_time, tcp_time)
            }
            Err(_) => {
                tracing::debug!(probe_target = %target, addr = %addr, "TCP connect timed out");
                ProbeReport::unreachable(dns_time, tcp_time)
            }
        }
    }
}

impl Probe for TcpProbe {
    fn probe<'a>(&'a self, target: &'a str) -> BoxFuture<'a, ProbeReport> {
        async move {
            let report = self.run(target).await;
            metrics::record_probe(&report);
            report
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn open_port_is_reachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = listener.accept().await;
        });

        let probe = TcpProbe::new(Duration::from_secs(2), 443);
        let report = probe.probe(&addr.to_string()).await;
        assert!(report.reachable);
    }

    #[tokio::test]
    async fn closed_port_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let probe = TcpProbe::new(Duration::from_secs(2), 443);
        let report = probe.probe(&addr.to_string()).await;
        assert!(!report.reachable);
    }

    #[tokio::test]
    async fn unresolvable_host_is_unreachable() {
        let probe = TcpProbe::new(Duration::from_secs(2), 443);
        let report = probe.probe("no-such-host.invalid:443").await;
        assert!(!report.reachable);
        assert_eq!(report.tcp_time, Duration::ZERO);
    }
}
