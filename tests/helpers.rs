// Shared test helpers: a throwaway PKI and local rustls servers.
//
// Every test file that needs a TLS endpoint includes this module with `mod helpers;`.

use std::sync::Arc;

use chrono::{Datelike, Duration, Utc};
use ingress_validator::initialization::TrustStore;
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, IsCa, KeyPair, KeyUsagePurpose,
};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::{RootCertStore, ServerConfig, SupportedProtocolVersion};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

/// A CA and one `localhost` leaf signed by it.
pub struct TestPki {
    pub ca: Certificate,
    pub leaf: Certificate,
    leaf_key: KeyPair,
}

impl TestPki {
    /// Leaf valid for the rcgen default period (decades).
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Leaf that expires `days` from today (at midnight UTC).
    #[allow(dead_code)]
    pub fn expiring_in(days: i64) -> Self {
        Self::build(Some(days))
    }

    fn build(leaf_days: Option<i64>) -> Self {
        let ca_key = KeyPair::generate().expect("Failed to generate CA key");
        let mut ca_params = CertificateParams::new(Vec::<String>::new()).expect("CA params");
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        ca_params
            .distinguished_name
            .push(DnType::CommonName, "ingress_validator test CA");
        ca_params.key_usages = vec![KeyUsagePurpose::KeyCertSign, KeyUsagePurpose::CrlSign];
        let ca = ca_params.self_signed(&ca_key).expect("Failed to self-sign CA");

        let leaf_key = KeyPair::generate().expect("Failed to generate leaf key");
        let mut leaf_params =
            CertificateParams::new(vec!["localhost".to_string()]).expect("leaf params");
        leaf_params
            .distinguished_name
            .push(DnType::CommonName, "localhost");
        if let Some(days) = leaf_days {
            let not_after = (Utc::now() + Duration::days(days)).date_naive();
            leaf_params.not_after = rcgen::date_time_ymd(
                not_after.year(),
                not_after.month() as u8,
                not_after.day() as u8,
            );
        }
        let leaf = leaf_params
            .signed_by(&leaf_key, &ca, &ca_key)
            .expect("Failed to sign leaf");

        Self { ca, leaf, leaf_key }
    }

    /// Trust store with only this CA as an anchor.
    #[allow(dead_code)]
    pub fn trust_store(&self) -> TrustStore {
        let mut roots = RootCertStore::empty();
        roots
            .add(self.ca.der().clone())
            .expect("Failed to add test CA");
        TrustStore {
            roots,
            bundle: Vec::new(),
        }
    }

    /// Leaf followed by the CA, as a server would normally send it.
    #[allow(dead_code)]
    pub fn chain(&self) -> Vec<CertificateDer<'static>> {
        vec![self.leaf.der().clone(), self.ca.der().clone()]
    }

    fn key(&self) -> PrivateKeyDer<'static> {
        PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(self.leaf_key.serialize_der()))
    }
}

/// Starts a TLS server on `127.0.0.1` that presents `chain` and speaks only
/// `versions`. Returns the bound port; the server runs until the test ends.
#[allow(dead_code)]
pub async fn spawn_tls_server(
    pki: &TestPki,
    chain: Vec<CertificateDer<'static>>,
    versions: &[&'static SupportedProtocolVersion],
) -> u16 {
    let config = ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_protocol_versions(versions)
    .expect("Failed to select protocol versions")
    .with_no_client_auth()
    .with_single_cert(chain, pki.key())
    .expect("Failed to build server config");
    let acceptor = TlsAcceptor::from(Arc::new(config));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let port = listener.local_addr().expect("local addr").port();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                // Handshake failures are part of several tests; ignore them.
                if let Ok(mut tls) = acceptor.accept(stream).await {
                    let _ = tls.shutdown().await;
                }
            });
        }
    });

    port
}

/// Self-signed CA certificate that expired on 2021-09-30, unrelated to any test PKI.
#[allow(dead_code)]
pub fn stale_cross_sign() -> CertificateDer<'static> {
    let key = KeyPair::generate().expect("Failed to generate key");
    let mut params = CertificateParams::new(Vec::<String>::new()).expect("params");
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params
        .distinguished_name
        .push(DnType::CommonName, "stale cross-sign");
    params.not_before = rcgen::date_time_ymd(2016, 9, 30);
    params.not_after = rcgen::date_time_ymd(2021, 9, 30);
    params
        .self_signed(&key)
        .expect("Failed to self-sign")
        .der()
        .clone()
}

/// PEM encoding of the CA certificate, for `--ca-bundle`.
#[allow(dead_code)]
pub fn ca_pem(pki: &TestPki) -> String {
    pki.ca.pem()
}

/// `kubectl get ingress -A -o json` style document with one ingress per host list.
#[allow(dead_code)]
pub fn ingress_list_json(ingresses: &[&[&str]]) -> String {
    let items: Vec<serde_json::Value> = ingresses
        .iter()
        .enumerate()
        .map(|(i, hosts)| {
            let rules: Vec<serde_json::Value> = hosts
                .iter()
                .map(|host| serde_json::json!({ "host": host }))
                .collect();
            serde_json::json!({
                "apiVersion": "networking.k8s.io/v1",
                "kind": "Ingress",
                "metadata": { "name": format!("ingress-{i}"), "namespace": "default" },
                "spec": { "rules": rules }
            })
        })
        .collect();
    serde_json::json!({ "apiVersion": "v1", "kind": "List", "items": items }).to_string()
}
