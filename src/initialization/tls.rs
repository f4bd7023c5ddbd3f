//! TLS client configuration.
//!
//! The inspector dials every host with one shared `ClientConfig`. Trust comes from the
//! webpki root set, optionally extended with a PEM bundle for private CAs, and the
//! offered protocol versions are limited to the configured range. The same trust
//! anchors back the [`ChainVerifier`] that picks the verified path out of what each
//! server presents.

use std::path::Path;
use std::sync::Arc;

use rustls::crypto::ring::default_provider;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::CertificateDer;
use rustls::{ClientConfig, RootCertStore, SupportedProtocolVersion};

use crate::config::{Config, TlsVersion};
use crate::error_handling::SetupError;
use crate::tls::ChainVerifier;

/// Trust anchors plus the full certificates loaded from the CA bundle.
pub struct TrustStore {
    pub roots: RootCertStore,
    pub bundle: Vec<CertificateDer<'static>>,
}

impl TrustStore {
    /// A store trusting nothing.
    pub fn empty() -> Self {
        Self {
            roots: RootCertStore::empty(),
            bundle: Vec::new(),
        }
    }
}

/// The handshake configuration and the chain verifier built from the same anchors.
#[derive(Clone)]
pub struct InspectorTls {
    pub client_config: Arc<ClientConfig>,
    pub chain_verifier: Arc<ChainVerifier>,
}

/// Maps a configured version range onto the versions rustls implements.
///
/// rustls speaks TLS 1.2 and 1.3 only; TLS 1.1 in the range is accepted but cannot
/// be offered.
pub fn supported_protocol_versions(
    min: TlsVersion,
    max: TlsVersion,
) -> Vec<&'static SupportedProtocolVersion> {
    [
        (TlsVersion::Tls12, &rustls::version::TLS12),
        (TlsVersion::Tls13, &rustls::version::TLS13),
    ]
    .into_iter()
    .filter(|(version, _)| (min..=max).contains(version))
    .map(|(_, supported)| supported)
    .collect()
}

/// Returns the webpki roots, plus the certificates in `ca_bundle` when given.
///
/// # Errors
///
/// Returns `SetupError::CaBundle` if the bundle cannot be read, contains an invalid
/// certificate, or contains no certificates at all.
pub fn init_root_store(ca_bundle: Option<&Path>) -> Result<TrustStore, SetupError> {
    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let mut bundle = Vec::new();

    if let Some(path) = ca_bundle {
        let bundle_error = |reason: String| SetupError::CaBundle {
            path: path.display().to_string(),
            reason,
        };
        let certs = CertificateDer::pem_file_iter(path)
            .map_err(|e| bundle_error(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| bundle_error(e.to_string()))?;
        if certs.is_empty() {
            return Err(bundle_error("no certificates found".to_string()));
        }
        for cert in &certs {
            root_store
                .add(cert.clone())
                .map_err(|e| bundle_error(e.to_string()))?;
        }
        log::info!("Added {} CA certificate(s) from {}", certs.len(), path.display());
        bundle = certs;
    }

    Ok(TrustStore {
        roots: root_store,
        bundle,
    })
}

/// Builds the handshake configuration and chain verifier for a trust store and
/// version range.
///
/// # Errors
///
/// Returns `SetupError::UnsupportedTlsRange` when no speakable version lies in the
/// range, or `SetupError::TlsConfig` if rustls rejects the configuration.
pub fn build_tls_config(
    trust: TrustStore,
    min: TlsVersion,
    max: TlsVersion,
) -> Result<InspectorTls, SetupError> {
    let versions = supported_protocol_versions(min, max);
    if versions.is_empty() {
        return Err(SetupError::UnsupportedTlsRange {
            min: min.to_string(),
            max: max.to_string(),
        });
    }
    if min < TlsVersion::Tls12 {
        log::debug!("{min} requested as minimum; rustls offers TLSv1.2 and above only");
    }

    let chain_verifier = ChainVerifier::new(&trust.roots, trust.bundle);
    let config = ClientConfig::builder_with_provider(Arc::new(default_provider()))
        .with_protocol_versions(&versions)?
        .with_root_certificates(trust.roots)
        .with_no_client_auth();

    Ok(InspectorTls {
        client_config: Arc::new(config),
        chain_verifier: Arc::new(chain_verifier),
    })
}

/// Builds the handshake configuration described by `config`.
///
/// # Errors
///
/// See [`init_root_store`] and [`build_tls_config`].
pub fn init_tls_config(config: &Config) -> Result<InspectorTls, SetupError> {
    let trust = init_root_store(config.ca_bundle.as_deref())?;
    build_tls_config(trust, config.min_tls_version, config.max_tls_version)
}
