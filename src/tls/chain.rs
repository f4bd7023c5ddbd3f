//! Verified chain reconstruction.
//!
//! Servers often send more than the path the verifier needs, such as an expired
//! cross-sign left in the bundle. Only the certificates on the path from the leaf to
//! a trust anchor decide when a host stops validating, so the inspector evaluates
//! that path and nothing else.

use rustls::crypto::ring::default_provider;
use rustls::pki_types::{CertificateDer, SignatureVerificationAlgorithm, TrustAnchor, UnixTime};
use rustls::RootCertStore;
use webpki::{EndEntityCert, KeyUsage};

/// Rebuilds the path a handshake was verified along.
///
/// Path building uses the same anchors and signature algorithms as the handshake
/// configuration, so it selects the same path the handshake accepted.
pub struct ChainVerifier {
    anchors: Vec<TrustAnchor<'static>>,
    anchor_certificates: Vec<CertificateDer<'static>>,
    algorithms: &'static [&'static dyn SignatureVerificationAlgorithm],
}

impl ChainVerifier {
    /// `anchor_certificates` are full certificates for anchors in `roots`, used to
    /// report the anchor itself when the server does not send it.
    pub fn new(roots: &RootCertStore, anchor_certificates: Vec<CertificateDer<'static>>) -> Self {
        Self {
            anchors: roots.roots.clone(),
            anchor_certificates,
            algorithms: default_provider().signature_verification_algorithms.all,
        }
    }

    /// Returns the leaf, the intermediates on the verified path, and the trust anchor
    /// when a certificate for it is known.
    ///
    /// # Errors
    ///
    /// Returns the path building error when `presented` does not chain to a trust
    /// anchor at `now`.
    pub fn verified_chain(
        &self,
        presented: &[CertificateDer<'_>],
        now: UnixTime,
    ) -> Result<Vec<CertificateDer<'static>>, webpki::Error> {
        let Some((leaf, intermediates)) = presented.split_first() else {
            return Err(webpki::Error::BadDer);
        };
        let end_entity = EndEntityCert::try_from(leaf)?;
        let path = end_entity.verify_for_usage(
            self.algorithms,
            &self.anchors,
            intermediates,
            now,
            KeyUsage::server_auth(),
            None,
            None,
        )?;

        let mut chain = vec![leaf.clone().into_owned()];
        chain.extend(path.intermediate_certificates().map(|cert| cert.der().into_owned()));
        match self.anchor_certificate(path.anchor(), intermediates) {
            Some(anchor) => chain.push(anchor),
            None => log::debug!("Trust anchor certificate not available; reporting the path below it"),
        }
        Ok(chain)
    }

    /// Finds a certificate for `anchor`, first among the presented certificates and
    /// then among the configured anchor certificates.
    fn anchor_certificate(
        &self,
        anchor: &TrustAnchor<'_>,
        presented: &[CertificateDer<'_>],
    ) -> Option<CertificateDer<'static>> {
        if let Some(cert) = presented.iter().find(|cert| is_certificate_for(cert, anchor)) {
            return Some(cert.clone().into_owned());
        }
        self.anchor_certificates
            .iter()
            .find(|cert| is_certificate_for(cert, anchor))
            .cloned()
    }
}

fn is_certificate_for(cert: &CertificateDer<'_>, anchor: &TrustAnchor<'_>) -> bool {
    webpki::anchor_from_trusted_cert(cert).is_ok_and(|candidate| {
        candidate.subject.as_ref() == anchor.subject.as_ref()
            && candidate.subject_public_key_info.as_ref()
                == anchor.subject_public_key_info.as_ref()
    })
}
