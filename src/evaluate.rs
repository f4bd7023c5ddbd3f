//! Expiry evaluation.
//!
//! Pure functions only: the same host result, `now`, and threshold always produce the
//! same [`Evaluation`].

use chrono::{DateTime, Utc};

use crate::config::SECONDS_PER_DAY;
use crate::models::{Certificate, Classification, HostResult, Inspection};

/// Verdict for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub classification: Classification,
    /// Smallest days-remaining across the chain; `None` when there are no certificates.
    pub min_days_remaining: Option<i64>,
    /// Subject of the certificate that expires first.
    pub soonest_subject: Option<String>,
    pub failure_reason: Option<String>,
}

/// Whole days from `now` until `not_after`, rounded toward negative infinity.
///
/// A certificate that expired an hour ago has `-1` days remaining.
pub fn days_remaining(not_after: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (not_after - now).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// The certificate with the fewest days remaining and that count.
///
/// Ties keep the earliest certificate in chain order, which is the leaf when it is
/// among them.
pub fn soonest_expiring(
    certificates: &[Certificate],
    now: DateTime<Utc>,
) -> Option<(&Certificate, i64)> {
    certificates
        .iter()
        .map(|cert| (cert, days_remaining(cert.not_after, now)))
        .fold(None, |best, (cert, days)| match best {
            Some((_, best_days)) if best_days <= days => best,
            _ => Some((cert, days)),
        })
}

/// Classifies one host result against `threshold_days`.
pub fn evaluate(result: &HostResult, now: DateTime<Utc>, threshold_days: i64) -> Evaluation {
    match &result.inspection {
        Inspection::Failed { kind, reason } => Evaluation {
            classification: Classification::from(*kind),
            min_days_remaining: None,
            soonest_subject: None,
            failure_reason: Some(reason.clone()),
        },
        Inspection::Connected { certificates, .. } => match soonest_expiring(certificates, now) {
            None => Evaluation {
                classification: Classification::NoCertificate,
                min_days_remaining: None,
                soonest_subject: None,
                failure_reason: Some("TLS handshake succeeded but no certificate was presented".to_string()),
            },
            Some((cert, days)) => Evaluation {
                classification: if days < threshold_days {
                    Classification::ExpiringSoon
                } else {
                    Classification::Ok
                },
                min_days_remaining: Some(days),
                soonest_subject: Some(cert.subject.clone()),
                failure_reason: None,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Host;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn cert(subject: &str, not_after: DateTime<Utc>) -> Certificate {
        Certificate {
            identity: subject.as_bytes().to_vec(),
            serial: "01".to_string(),
            subject: subject.to_string(),
            issuer: "CN=Test CA".to_string(),
            dns_names: Vec::new(),
            not_before: now() - Duration::days(30),
            not_after,
        }
    }

    fn connected(certs: Vec<Certificate>) -> HostResult {
        HostResult::connected(Host::new("a.com", 443), Some("TLSv1.2".to_string()), certs)
    }

    #[test]
    fn test_days_remaining_floors() {
        assert_eq!(days_remaining(now() + Duration::days(10), now()), 10);
        assert_eq!(
            days_remaining(now() + Duration::days(10) - Duration::seconds(1), now()),
            9
        );
        assert_eq!(days_remaining(now(), now()), 0);
        assert_eq!(days_remaining(now() - Duration::hours(1), now()), -1);
    }

    #[test]
    fn test_minimum_not_leaf_or_average() {
        let result = connected(vec![
            cert("CN=leaf", now() + Duration::days(10)),
            cert("CN=intermediate", now() + Duration::days(90)),
            cert("CN=root", now() + Duration::days(5)),
        ]);
        let evaluation = evaluate(&result, now(), 45);
        assert_eq!(evaluation.min_days_remaining, Some(5));
        assert_eq!(evaluation.classification, Classification::ExpiringSoon);
        assert_eq!(evaluation.soonest_subject.as_deref(), Some("CN=root"));
        assert!(evaluation.failure_reason.is_none());
    }

    #[test]
    fn test_threshold_boundary() {
        let at = connected(vec![cert("CN=leaf", now() + Duration::days(45))]);
        assert_eq!(evaluate(&at, now(), 45).classification, Classification::Ok);

        let below = connected(vec![cert("CN=leaf", now() + Duration::days(44))]);
        assert_eq!(
            evaluate(&below, now(), 45).classification,
            Classification::ExpiringSoon
        );
    }

    #[test]
    fn test_expired_certificate_is_expiring_soon() {
        let result = connected(vec![cert("CN=leaf", now() - Duration::days(3))]);
        let evaluation = evaluate(&result, now(), 45);
        assert_eq!(evaluation.classification, Classification::ExpiringSoon);
        assert_eq!(evaluation.min_days_remaining, Some(-3));
    }

    #[test]
    fn test_zero_certificates_is_no_certificate() {
        let evaluation = evaluate(&connected(Vec::new()), now(), 45);
        assert_eq!(evaluation.classification, Classification::NoCertificate);
        assert_eq!(evaluation.min_days_remaining, None);
        assert!(evaluation.failure_reason.is_some());
    }

    #[test]
    fn test_failures_carry_through() {
        let unreachable = HostResult::unreachable(Host::new("a.com", 443), "connection refused");
        let evaluation = evaluate(&unreachable, now(), 45);
        assert_eq!(evaluation.classification, Classification::Unreachable);
        assert_eq!(evaluation.failure_reason.as_deref(), Some("connection refused"));

        let mismatch = HostResult::protocol_mismatch(Host::new("a.com", 443), "protocol_version");
        assert_eq!(
            evaluate(&mismatch, now(), 45).classification,
            Classification::ProtocolMismatch
        );
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let result = connected(vec![
            cert("CN=leaf", now() + Duration::days(60)),
            cert("CN=intermediate", now() + Duration::days(400)),
        ]);
        let first = evaluate(&result, now(), 45);
        for _ in 0..10 {
            assert_eq!(evaluate(&result, now(), 45), first);
        }
        assert_eq!(first.classification, Classification::Ok);
    }

    #[test]
    fn test_ties_keep_chain_order() {
        let certs = vec![
            cert("CN=leaf", now() + Duration::days(20)),
            cert("CN=intermediate", now() + Duration::days(20)),
        ];
        let (soonest, days) = soonest_expiring(&certs, now()).unwrap();
        assert_eq!(soonest.subject, "CN=leaf");
        assert_eq!(days, 20);
    }
}
