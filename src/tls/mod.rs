//! TLS certificate inspection.
//!
//! This module connects to each ingress host and collects the certificate chain the
//! handshake verified (see [`ChainVerifier`]):
//! - Certificate subject and issuer
//! - Serial number and subject alternative names
//! - Validity period (not before/after dates)
//! - Negotiated TLS version
//!
//! Uses `tokio-rustls` for async TLS connections and `x509-parser` for certificate
//! parsing. Nothing in here returns an error: every failure is recorded on the
//! returned [`HostResult`].

mod chain;
mod extract;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::ProtocolVersion;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;

use crate::error_handling::{
    categorize_handshake_error, describe_handshake_error, HandshakeErrorKind,
};
use crate::initialization::InspectorTls;
use crate::models::{Certificate, Host, HostResult};

pub use chain::ChainVerifier;
pub(crate) use extract::distinct_certificates;

/// Inspects one host. Implementations must not fail: problems become data.
#[async_trait]
pub trait Inspect: Send + Sync {
    async fn inspect(&self, host: &Host) -> HostResult;
}

/// Performs a real TLS handshake per host.
pub struct TlsInspector {
    connector: TlsConnector,
    chain_verifier: Arc<ChainVerifier>,
    connect_timeout: Duration,
    handshake_timeout: Duration,
}

impl TlsInspector {
    pub fn new(tls: InspectorTls, connect_timeout: Duration, handshake_timeout: Duration) -> Self {
        Self {
            connector: TlsConnector::from(tls.client_config),
            chain_verifier: tls.chain_verifier,
            connect_timeout,
            handshake_timeout,
        }
    }

    /// Certificates on the verified path, leaf first.
    ///
    /// Falls back to the presented chain if the path cannot be rebuilt.
    fn verified_certificates(
        &self,
        domain: &str,
        presented: &[CertificateDer<'_>],
    ) -> Vec<Certificate> {
        match self.chain_verifier.verified_chain(presented, UnixTime::now()) {
            Ok(chain) => {
                if chain.len() != presented.len() {
                    log::debug!(
                        "{domain}: verified path has {} certificate(s), server presented {}",
                        chain.len(),
                        presented.len()
                    );
                }
                distinct_certificates(domain, &chain)
            }
            Err(e) => {
                log::warn!("{domain}: could not rebuild the verified chain ({e}); using the presented chain");
                distinct_certificates(domain, presented)
            }
        }
    }
}

#[async_trait]
impl Inspect for TlsInspector {
    async fn inspect(&self, host: &Host) -> HostResult {
        let domain = &host.name;
        log::debug!("Inspecting TLS certificates for {domain}:{}", host.port);

        let server_name = match ServerName::try_from(domain.clone()) {
            Ok(name) => name,
            Err(e) => {
                log::warn!("Invalid DNS name {domain}: {e}");
                return HostResult::unreachable(host.clone(), format!("invalid DNS name: {e}"));
            }
        };

        let sock = match tokio::time::timeout(
            self.connect_timeout,
            TcpStream::connect((domain.as_str(), host.port)),
        )
        .await
        {
            Ok(Ok(sock)) => sock,
            Ok(Err(e)) => {
                log::warn!("Failed to connect to {domain}:{} - {e}", host.port);
                return HostResult::unreachable(
                    host.clone(),
                    format!("failed to connect to {domain}:{}: {e}", host.port),
                );
            }
            Err(_) => {
                log::warn!("TCP connection timeout for {domain}:{}", host.port);
                return HostResult::unreachable(
                    host.clone(),
                    format!(
                        "TCP connection timeout for {domain}:{} ({}s)",
                        host.port,
                        self.connect_timeout.as_secs_f32()
                    ),
                );
            }
        };

        let mut tls_stream = match tokio::time::timeout(
            self.handshake_timeout,
            self.connector.connect(server_name, sock),
        )
        .await
        {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                let reason = describe_handshake_error(&e);
                return match categorize_handshake_error(&e) {
                    HandshakeErrorKind::NoCertificatePresented => {
                        log::warn!("{domain} completed TLS without presenting a certificate");
                        HostResult::connected(host.clone(), None, Vec::new())
                    }
                    HandshakeErrorKind::Failure(kind) => {
                        log::warn!("TLS connection failed for {domain}: {reason}");
                        HostResult::failed(host.clone(), kind, reason)
                    }
                };
            }
            Err(_) => {
                log::warn!("TLS handshake timeout for {domain}");
                return HostResult::unreachable(
                    host.clone(),
                    format!(
                        "TLS handshake timeout for {domain} ({}s)",
                        self.handshake_timeout.as_secs_f32()
                    ),
                );
            }
        };

        let (_, connection) = tls_stream.get_ref();
        let tls_version = connection.protocol_version().map(version_label);
        let certificates = connection
            .peer_certificates()
            .map(|presented| self.verified_certificates(domain, presented))
            .unwrap_or_default();

        log::info!(
            "{domain}: {} certificate(s) over {}",
            certificates.len(),
            tls_version.as_deref().unwrap_or("unknown TLS version")
        );

        // Best-effort close_notify; the result is already complete.
        let _ = tls_stream.shutdown().await;

        HostResult::connected(host.clone(), tls_version, certificates)
    }
}

fn version_label(version: ProtocolVersion) -> String {
    match version {
        ProtocolVersion::TLSv1_2 => "TLSv1.2".to_string(),
        ProtocolVersion::TLSv1_3 => "TLSv1.3".to_string(),
        other => format!("{other:?}"),
    }
}
