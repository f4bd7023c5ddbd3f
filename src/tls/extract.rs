//! Certificate extraction utilities.

use std::collections::HashSet;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rustls::pki_types::CertificateDer;
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::time::ASN1Time;

use crate::models::Certificate;

/// Parses one DER certificate into the fields the evaluator and report need.
///
/// # Errors
///
/// Returns an error if the DER cannot be parsed or a validity date is out of range.
pub(crate) fn parse_certificate(der: &[u8]) -> Result<Certificate> {
    let (_, cert) =
        x509_parser::parse_x509_certificate(der).context("Failed to parse X.509 certificate")?;

    Ok(Certificate {
        identity: der.to_vec(),
        serial: cert.raw_serial_as_string(),
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        dns_names: extract_certificate_sans(&cert),
        not_before: asn1_to_utc(&cert.validity().not_before)?,
        not_after: asn1_to_utc(&cert.validity().not_after)?,
    })
}

/// Parses a presented chain and drops repeated certificates.
///
/// Certificates are matched by their DER encoding; the first occurrence wins, so the
/// leaf stays first. Entries that fail to parse are logged and skipped.
pub(crate) fn distinct_certificates(host: &str, chain: &[CertificateDer<'_>]) -> Vec<Certificate> {
    let mut seen = HashSet::new();
    let mut certificates = Vec::with_capacity(chain.len());

    for (position, der) in chain.iter().enumerate() {
        match parse_certificate(der.as_ref()) {
            Ok(cert) => {
                if seen.insert(cert.identity.clone()) {
                    certificates.push(cert);
                } else {
                    log::debug!("Duplicate certificate at chain position {position} for {host}");
                }
            }
            Err(e) => {
                log::warn!("Skipping certificate at chain position {position} for {host}: {e:#}");
            }
        }
    }

    certificates
}

/// DNS names from the subject alternative name extension.
fn extract_certificate_sans(cert: &X509Certificate<'_>) -> Vec<String> {
    let mut sans = Vec::new();

    for ext in cert.extensions() {
        if let ParsedExtension::SubjectAlternativeName(san) = ext.parsed_extension() {
            for general_name in &san.general_names {
                if let GeneralName::DNSName(dns_name) = general_name {
                    sans.push(dns_name.to_string());
                }
            }
        }
    }

    sans
}

fn asn1_to_utc(time: &ASN1Time) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(time.timestamp(), 0)
        .ok_or_else(|| anyhow!("certificate time {} is out of range", time.timestamp()))
}
