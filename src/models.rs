//! Core data model shared by the scan pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum_macros::{Display, EnumIter};

/// A DNS name taken from an ingress rule plus the port it is dialled on.
///
/// Identity is the name; the port is the same for every host in a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Host {
    pub name: String,
    pub port: u16,
}

impl Host {
    pub fn new(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            port,
        }
    }
}

impl std::fmt::Display for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// One leaf or intermediate certificate observed in a handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Certificate {
    /// DER encoding; two entries with the same identity are the same certificate.
    #[serde(skip)]
    pub identity: Vec<u8>,
    pub serial: String,
    pub subject: String,
    pub issuer: String,
    /// DNS names from the subject alternative name extension.
    pub dns_names: Vec<String>,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

/// Why a handshake could not be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// DNS, TCP, timeout, trust, or generic handshake failure.
    Unreachable,
    /// The server could not negotiate a protocol version inside the allowed range.
    ProtocolMismatch,
}

/// Outcome of inspecting a single host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inspection {
    /// The handshake succeeded. `certificates` holds the distinct certificates of
    /// the verified chain, leaf first, and may be empty.
    Connected {
        tls_version: Option<String>,
        certificates: Vec<Certificate>,
    },
    /// The handshake did not complete.
    Failed { kind: FailureKind, reason: String },
}

/// A host together with what its inspection found. Built once per scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostResult {
    pub host: Host,
    pub inspection: Inspection,
}

impl HostResult {
    pub fn connected(host: Host, tls_version: Option<String>, certificates: Vec<Certificate>) -> Self {
        Self {
            host,
            inspection: Inspection::Connected {
                tls_version,
                certificates,
            },
        }
    }

    pub fn unreachable(host: Host, reason: impl Into<String>) -> Self {
        Self::failed(host, FailureKind::Unreachable, reason)
    }

    pub fn protocol_mismatch(host: Host, reason: impl Into<String>) -> Self {
        Self::failed(host, FailureKind::ProtocolMismatch, reason)
    }

    pub fn failed(host: Host, kind: FailureKind, reason: impl Into<String>) -> Self {
        Self {
            host,
            inspection: Inspection::Failed {
                kind,
                reason: reason.into(),
            },
        }
    }

    /// Certificates seen in the handshake; empty for failed inspections.
    pub fn certificates(&self) -> &[Certificate] {
        match &self.inspection {
            Inspection::Connected { certificates, .. } => certificates,
            Inspection::Failed { .. } => &[],
        }
    }

    /// Negotiated protocol version, if the handshake completed.
    pub fn tls_version(&self) -> Option<&str> {
        match &self.inspection {
            Inspection::Connected { tls_version, .. } => tls_version.as_deref(),
            Inspection::Failed { .. } => None,
        }
    }

    /// Only plain connection failures are worth another attempt.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.inspection,
            Inspection::Failed {
                kind: FailureKind::Unreachable,
                ..
            }
        )
    }
}

/// Per-host verdict carried into the report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Display,
    EnumIter,
    clap::ValueEnum,
)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
#[strum(serialize_all = "SCREAMING-KEBAB-CASE")]
pub enum Classification {
    /// Every certificate is valid for at least the threshold.
    Ok,
    /// At least one certificate expires before the threshold.
    ExpiringSoon,
    /// The host could not be reached or the handshake failed.
    Unreachable,
    /// No protocol version inside the allowed range could be negotiated.
    ProtocolMismatch,
    /// The handshake succeeded but no certificate was presented.
    NoCertificate,
}

impl From<FailureKind> for Classification {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::Unreachable => Classification::Unreachable,
            FailureKind::ProtocolMismatch => Classification::ProtocolMismatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_display_and_serde_agree() {
        assert_eq!(Classification::ExpiringSoon.to_string(), "EXPIRING-SOON");
        assert_eq!(Classification::NoCertificate.to_string(), "NO-CERTIFICATE");
        assert_eq!(
            serde_json::to_string(&Classification::ProtocolMismatch).unwrap(),
            "\"PROTOCOL-MISMATCH\""
        );
        assert_eq!(serde_json::to_string(&Classification::Ok).unwrap(), "\"OK\"");
    }

    #[test]
    fn test_failed_result_has_no_certificates() {
        let result = HostResult::unreachable(Host::new("a.com", 443), "connection refused");
        assert!(result.certificates().is_empty());
        assert!(result.tls_version().is_none());
        assert!(result.is_retriable());
    }

    #[test]
    fn test_protocol_mismatch_is_not_retriable() {
        let result = HostResult::protocol_mismatch(Host::new("a.com", 443), "alert");
        assert!(!result.is_retriable());
    }
}
