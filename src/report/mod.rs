//! Scan report construction and rendering.
//!
//! A [`Report`] holds one entry per host in extraction order. It can be rendered as
//! pretty JSON (field order is fixed by the struct definitions) or as a plain text
//! table, and emitted through [`emit_report`].

mod emit;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ReportFormat;
use crate::evaluate::Evaluation;
use crate::models::{Certificate, Classification, HostResult};

pub use emit::{emit_report, emit_report_to, ReportTargets};

/// Everything one run found, ready to be serialized.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub threshold_days: i64,
    pub entries: Vec<ReportEntry>,
}

/// One host in the report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub host: String,
    pub port: u16,
    pub classification: Classification,
    pub days_remaining: Option<i64>,
    /// Subject of the certificate that expires first.
    pub soonest_subject: Option<String>,
    pub failure_reason: Option<String>,
    pub tls_version: Option<String>,
    pub certificates: Vec<Certificate>,
}

impl Report {
    /// Entries whose classification is one of `classes`, in report order.
    pub fn entries_in<'a>(
        &'a self,
        classes: &'a [Classification],
    ) -> impl Iterator<Item = &'a ReportEntry> + 'a {
        self.entries
            .iter()
            .filter(move |entry| classes.contains(&entry.classification))
    }

    /// Number of entries with the given classification.
    pub fn count(&self, classification: Classification) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.classification == classification)
            .count()
    }
}

/// Pairs each host result with its evaluation.
///
/// `results` and `evaluations` are parallel sequences; the report keeps their order.
pub fn build_report(
    results: &[HostResult],
    evaluations: &[Evaluation],
    generated_at: DateTime<Utc>,
    threshold_days: i64,
) -> Report {
    let entries = results
        .iter()
        .zip(evaluations)
        .map(|(result, evaluation)| ReportEntry {
            host: result.host.name.clone(),
            port: result.host.port,
            classification: evaluation.classification,
            days_remaining: evaluation.min_days_remaining,
            soonest_subject: evaluation.soonest_subject.clone(),
            failure_reason: evaluation.failure_reason.clone(),
            tls_version: result.tls_version().map(str::to_string),
            certificates: result.certificates().to_vec(),
        })
        .collect();

    Report {
        generated_at,
        threshold_days,
        entries,
    }
}

/// Renders the report in the requested format.
pub fn render(report: &Report, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Json => render_json(report),
        ReportFormat::Text => Ok(render_text(report)),
    }
}

pub fn render_json(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Renders a fixed-width table, one line per host.
pub fn render_text(report: &Report) -> String {
    let host_width = report
        .entries
        .iter()
        .map(|entry| entry.host.len())
        .max()
        .unwrap_or(0)
        .max("HOST".len());

    let mut out = format!(
        "Certificate report generated {} (threshold {} days)\n",
        report.generated_at.format("%Y-%m-%dT%H:%M:%SZ"),
        report.threshold_days
    );
    out.push_str(&format!(
        "{:<host_width$}  {:<17}  {:>5}  {:<8}  DETAIL\n",
        "HOST", "CLASSIFICATION", "DAYS", "TLS"
    ));

    for entry in &report.entries {
        let days = entry
            .days_remaining
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let detail = match (&entry.failure_reason, &entry.soonest_subject) {
            (Some(reason), _) => reason.clone(),
            (None, Some(subject)) => subject.clone(),
            (None, None) => String::new(),
        };
        out.push_str(&format!(
            "{:<host_width$}  {:<17}  {:>5}  {:<8}  {}\n",
            entry.host,
            entry.classification.to_string(),
            days,
            entry.tls_version.as_deref().unwrap_or("-"),
            detail
        ));
    }

    out
}
