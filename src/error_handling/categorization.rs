//! Handshake error categorization and retry strategy.
//!
//! `tokio-rustls` reports TLS failures as `std::io::Error` wrapping a `rustls::Error`.
//! This module unwraps that error and decides how the host is reported.

use std::io;
use std::time::Duration;

use rustls::AlertDescription;
use tokio_retry::strategy::{jitter, ExponentialBackoff};

use crate::models::FailureKind;

/// How a failed handshake is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeErrorKind {
    /// The server completed its side of the handshake without sending a certificate.
    NoCertificatePresented,
    /// The handshake failed; the host is reported with this failure kind.
    Failure(FailureKind),
}

/// Categorizes a handshake error returned by `TlsConnector::connect`.
///
/// Version negotiation failures become `ProtocolMismatch`: a `protocol_version` alert
/// from the server, or a peer incompatibility such as the server selecting a version
/// the configured range disables. Every other TLS error and all I/O errors become
/// `Unreachable`.
pub fn categorize_handshake_error(error: &io::Error) -> HandshakeErrorKind {
    let Some(tls_error) = error
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
    else {
        return HandshakeErrorKind::Failure(FailureKind::Unreachable);
    };
    categorize_tls_error(tls_error)
}

fn categorize_tls_error(error: &rustls::Error) -> HandshakeErrorKind {
    match error {
        rustls::Error::NoCertificatesPresented => HandshakeErrorKind::NoCertificatePresented,
        rustls::Error::AlertReceived(AlertDescription::ProtocolVersion)
        | rustls::Error::PeerIncompatible(_) => {
            HandshakeErrorKind::Failure(FailureKind::ProtocolMismatch)
        }
        _ => HandshakeErrorKind::Failure(FailureKind::Unreachable),
    }
}

/// Human-readable reason for a handshake error, preferring the TLS error text.
pub fn describe_handshake_error(error: &io::Error) -> String {
    match error
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
    {
        Some(tls_error) => format!("TLS handshake failed: {tls_error}"),
        None => format!("TLS handshake failed: {error}"),
    }
}

/// Creates an exponential backoff retry strategy.
///
/// Returns a retry strategy configured with:
/// - Initial delay: `RETRY_INITIAL_DELAY_MS` milliseconds
/// - Backoff factor: `RETRY_FACTOR` (doubles delay each retry)
/// - Maximum delay: `RETRY_MAX_DELAY_SECS` seconds
/// - Randomized jitter on each delay
/// - At most `retries` extra attempts
pub fn get_retry_strategy(retries: usize) -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(crate::config::RETRY_INITIAL_DELAY_MS)
        .factor(crate::config::RETRY_FACTOR)
        .max_delay(Duration::from_secs(crate::config::RETRY_MAX_DELAY_SECS))
        .map(jitter)
        .take(retries.min(crate::config::RETRY_MAX_ATTEMPTS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustls::PeerIncompatible;

    fn wrap(error: rustls::Error) -> io::Error {
        io::Error::new(io::ErrorKind::InvalidData, error)
    }

    #[test]
    fn test_protocol_version_alert_is_mismatch() {
        let err = wrap(rustls::Error::AlertReceived(AlertDescription::ProtocolVersion));
        assert_eq!(
            categorize_handshake_error(&err),
            HandshakeErrorKind::Failure(FailureKind::ProtocolMismatch)
        );
    }

    #[test]
    fn test_peer_incompatible_is_mismatch() {
        let err = wrap(rustls::Error::PeerIncompatible(
            PeerIncompatible::ServerTlsVersionIsDisabledByOurConfig,
        ));
        assert_eq!(
            categorize_handshake_error(&err),
            HandshakeErrorKind::Failure(FailureKind::ProtocolMismatch)
        );
    }

    #[test]
    fn test_misbehaving_peer_is_unreachable() {
        let err = wrap(rustls::Error::PeerMisbehaved(
            rustls::PeerMisbehaved::SelectedUnofferedCipherSuite,
        ));
        assert_eq!(
            categorize_handshake_error(&err),
            HandshakeErrorKind::Failure(FailureKind::Unreachable)
        );
    }

    #[test]
    fn test_untrusted_certificate_is_unreachable() {
        let err = wrap(rustls::Error::InvalidCertificate(
            rustls::CertificateError::UnknownIssuer,
        ));
        assert_eq!(
            categorize_handshake_error(&err),
            HandshakeErrorKind::Failure(FailureKind::Unreachable)
        );
        assert!(describe_handshake_error(&err).contains("TLS handshake failed"));
    }

    #[test]
    fn test_handshake_failure_alert_is_unreachable() {
        let err = wrap(rustls::Error::AlertReceived(AlertDescription::HandshakeFailure));
        assert_eq!(
            categorize_handshake_error(&err),
            HandshakeErrorKind::Failure(FailureKind::Unreachable)
        );
    }

    #[test]
    fn test_no_certificates_presented() {
        let err = wrap(rustls::Error::NoCertificatesPresented);
        assert_eq!(
            categorize_handshake_error(&err),
            HandshakeErrorKind::NoCertificatePresented
        );
    }

    #[test]
    fn test_plain_io_error_is_unreachable() {
        let err = io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer");
        assert_eq!(
            categorize_handshake_error(&err),
            HandshakeErrorKind::Failure(FailureKind::Unreachable)
        );
    }

    #[test]
    fn test_retry_strategy_is_bounded() {
        assert_eq!(get_retry_strategy(2).count(), 2);
        assert_eq!(get_retry_strategy(0).count(), 0);
        assert_eq!(
            get_retry_strategy(100).count(),
            crate::config::RETRY_MAX_ATTEMPTS
        );
    }
}
