//! TLS certificate chain inspection.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use rustls::pki_types::{CertificateDer, ServerName};
use rustls::{ClientConfig, RootCertStore};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time;
use tokio_rustls::TlsConnector;
use x509_parser::prelude::*;

use crate::config::CertConfig;
use crate::probe::split_host_port;

/// Summary of one certificate of the presented chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertInfo {
    pub issuer: String,
    pub subject: String,
    /// `notAfter`, RFC 3339.
    pub expiration: String,
    /// Whether `notAfter` is still in the future.
    pub valid: bool,
}

#[derive(Debug, Error)]
pub enum CertError {
    #[error("invalid server name '{0}'")]
    ServerName(String),
    #[error("TLS client configuration error: {0}")]
    Config(#[from] rustls::Error),
    #[error("connection failed: {0}")]
    Connect(std::io::Error),
    #[error("TLS handshake failed: {0}")]
    Handshake(std::io::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("peer presented no certificates")]
    NoPeerCertificates,
    #[error("unparseable certificate: {0}")]
    Parse(String),
}

/// Fetches the certificate chain a host presents.
pub trait CertInspector: Send + Sync {
    fn inspect<'a>(&'a self, target: &'a str) -> BoxFuture<'a, Result<Vec<CertInfo>, CertError>>;
}

/// rustls-based inspector trusting the Mozilla root set.
#[derive(Clone)]
pub struct TlsCertInspector {
    connector: TlsConnector,
    timeout: Duration,
    default_port: u16,
}

impl TlsCertInspector {
    pub fn new(timeout: Duration, default_port: u16) -> Result<Self, CertError> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        tracing::debug!(roots = roots.len(), "Loaded root certificates");

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .with_root_certificates(roots)
            .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            timeout,
            default_port,
        })
    }

    pub fn from_config(config: &CertConfig, default_port: u16) -> Result<Self, CertError> {
        Self::new(Duration::from_secs(config.timeout_secs), default_port)
    }

    async fn fetch(&self, target: &str) -> Result<Vec<CertInfo>, CertError> {
        let (host, port) = split_host_port(target, self.default_port);
        let server_name =
            ServerName::try_from(host.clone()).map_err(|_| CertError::ServerName(host.clone()))?;

        let stream = time::timeout(self.timeout, TcpStream::connect((host.as_str(), port)))
            .await
            .map_err(|_| CertError::Timeout(self.timeout))?
            .map_err(CertError::Connect)?;

        let tls = time::timeout(self.timeout, self.connector.connect(server_name, stream))
            .await
            .map_err(|_| CertError::Timeout(self.timeout))?
            .map_err(CertError::Handshake)?;

        let (_, session) = tls.get_ref();
        let chain = session
            .peer_certificates()
            .filter(|certs| !certs.is_empty())
            .ok_or(CertError::NoPeerCertificates)?;

        let now = Utc::now();
        chain.iter().map(|der| describe(der, now)).collect()
    }
}

impl CertInspector for TlsCertInspector {
    fn inspect<'a>(&'a self, target: &'a str) -> BoxFuture<'a, Result<Vec<CertInfo>, CertError>> {
        async move {
            let result = self.fetch(target).await;
            if let Err(e) = &result {
                tracing::debug!(probe_target = %target, error = %e, "Certificate fetch failed");
            }
            result
        }
        .boxed()
    }
}

/// Decode a DER certificate into a [`CertInfo`] evaluated at `now`.
pub fn describe(der: &CertificateDer<'_>, now: DateTime<Utc>) -> Result<CertInfo, CertError> {
    let (_, cert) =
        X509Certificate::from_der(der.as_ref()).map_err(|e| CertError::Parse(e.to_string()))?;

    let not_after = cert.validity().not_after.timestamp();
    let expiration = DateTime::<Utc>::from_timestamp(not_after, 0)
        .ok_or_else(|| CertError::Parse(format!("notAfter out of range: {}", not_after)))?;

    Ok(CertInfo {
        issuer: cert.issuer().to_string(),
        subject: cert.subject().to_string(),
        expiration: expiration.to_rfc3339_opts(SecondsFormat::Secs, true),
        valid: expiration > now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inspector_builds_with_bundled_roots() {
        assert!(TlsCertInspector::new(Duration::from_secs(1), 443).is_ok());
    }

    #[test]
    fn garbage_der_is_a_parse_error() {
        let der = CertificateDer::from(vec![0x30, 0x03, 0x01, 0x01, 0xff]);
        assert!(matches!(describe(&der, Utc::now()), Err(CertError::Parse(_))));
    }

    #[tokio::test]
    async fn refused_connection_is_reported() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let inspector = TlsCertInspector::new(Duration::from_secs(2), 443).unwrap();
        let result = inspector.inspect(&addr.to_string()).await;
        assert!(matches!(result, Err(CertError::Connect(_))));
    }

    #[tokio::test]
    async fn plaintext_peer_fails_handshake() {
        use tokio::io::AsyncWriteExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let _ = socket.write_all(b"HTTP/1.1 400 Bad Request\r\n\r\n").await;
                let _ = socket.shutdown().await;
            }
        });

        let inspector = TlsCertInspector::new(Duration::from_secs(2), 443).unwrap();
        let result = inspector.inspect(&addr.to_string()).await;
        assert!(matches!(result, Err(CertError::Handshake(_))));
    }
}
