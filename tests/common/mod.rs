//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use status_monitor::config::MonitorConfig;
use status_monitor::events::MemorySink;
use status_monitor::http::HttpServer;
use status_monitor::lifecycle::Shutdown;
use status_monitor::probe::{split_host_port, CertError, CertInfo, CertInspector, Probe, ProbeReport};

/// Probe with scripted reachability per host; unknown hosts are down.
#[derive(Clone, Default)]
pub struct FakeProbe {
    reachable: Arc<Mutex<HashMap<String, bool>>>,
    delay: Duration,
}

impl FakeProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn set(&self, host: &str, reachable: bool) {
        self.reachable.lock().unwrap().insert(host.to_string(), reachable);
    }
}

impl Probe for FakeProbe {
    fn probe<'a>(&'a self, target: &'a str) -> BoxFuture<'a, ProbeReport> {
        async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let (host, _) = split_host_port(target, 443);
            let reachable = self
                .reachable
                .lock()
                .unwrap()
                .get(&host)
                .copied()
                .unwrap_or(false);
            ProbeReport {
                dns_time: Duration::from_micros(150),
                tcp_time: Duration::from_micros(900),
                reachable,
            }
        }
        .boxed()
    }
}

/// Certificate inspector returning a fixed chain, or failing.
#[derive(Clone)]
pub struct FakeCerts {
    chain: Option<Vec<CertInfo>>,
}

impl FakeCerts {
    pub fn with_chain(chain: Vec<CertInfo>) -> Self {
        Self { chain: Some(chain) }
    }

    pub fn failing() -> Self {
        Self { chain: None }
    }
}

impl CertInspector for FakeCerts {
    fn inspect<'a>(&'a self, _target: &'a str) -> BoxFuture<'a, Result<Vec<CertInfo>, CertError>> {
        async move {
            match &self.chain {
                Some(chain) => Ok(chain.clone()),
                None => Err(CertError::NoPeerCertificates),
            }
        }
        .boxed()
    }
}

pub fn leaf_cert() -> CertInfo {
    CertInfo {
        issuer: "CN=Test CA".into(),
        subject: "CN=example.test".into(),
        expiration: "2030-01-01T00:00:00Z".into(),
        valid: true,
    }
}

/// Config suited to tests: ephemeral port, fast sweeps.
pub fn test_config() -> MonitorConfig {
    let mut config = MonitorConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.event_log.path = None;
    config.tracker.sweep_interval_ms = 50;
    config
}

/// Server wired to fakes and an in-memory event trail.
pub fn build_server(config: MonitorConfig, probe: FakeProbe, certs: FakeCerts) -> (HttpServer, MemorySink) {
    let sink = MemorySink::new();
    let server = HttpServer::with_parts(config, Arc::new(probe), Arc::new(certs), Box::new(sink.clone()));
    (server, sink)
}

/// A server running on an ephemeral local port.
pub struct RunningServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<std::io::Result<()>>,
}

impl RunningServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
            .expect("server failed");
    }
}

pub async fn spawn_server(server: HttpServer) -> RunningServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.clone()));
    RunningServer {
        addr,
        shutdown,
        handle,
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
pub async fn eventually<F: Fn() -> bool>(timeout: Duration, condition: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
