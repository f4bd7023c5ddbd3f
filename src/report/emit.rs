//! Report emission to stdout, a file, and an HTTP endpoint.

use std::io::{self, Write};
use std::path::PathBuf;

use crate::config::{Config, ReportFormat};

use super::{render, render_json, Report};

/// Where the finished report goes.
#[derive(Debug, Clone)]
pub struct ReportTargets {
    pub format: ReportFormat,
    /// Written in `format` when set.
    pub file: Option<PathBuf>,
    /// Receives the JSON document as a POST body when set.
    pub url: Option<String>,
}

impl From<&Config> for ReportTargets {
    fn from(config: &Config) -> Self {
        Self {
            format: config.report_format,
            file: config.report_file.clone(),
            url: config.report_url.clone(),
        }
    }
}

/// Emits `report` to stdout and every configured target.
///
/// Printing does not go through the logger, so the report appears whatever the log
/// level. Failures writing the file or posting to the URL are logged and do not stop
/// the run; the return value counts how many targets failed.
pub async fn emit_report(
    report: &Report,
    targets: &ReportTargets,
    client: &reqwest::Client,
) -> usize {
    emit_report_to(report, targets, client, &mut io::stdout()).await
}

/// Like [`emit_report`], printing to `out` instead of stdout.
pub async fn emit_report_to(
    report: &Report,
    targets: &ReportTargets,
    client: &reqwest::Client,
    out: &mut (dyn Write + Send),
) -> usize {
    let mut failures = 0;

    let rendered = match render(report, targets.format) {
        Ok(rendered) => rendered,
        Err(e) => {
            log::error!("Failed to render report: {e}");
            return 1;
        }
    };
    if let Err(e) = writeln!(out, "{rendered}").and_then(|()| out.flush()) {
        log::error!("Failed to print report: {e}");
        failures += 1;
    }

    if let Some(path) = &targets.file {
        match tokio::fs::write(path, rendered.as_bytes()).await {
            Ok(()) => log::info!("Report written to {}", path.display()),
            Err(e) => {
                log::error!("Failed to write report to {}: {e}", path.display());
                failures += 1;
            }
        }
    }

    if let Some(url) = &targets.url {
        if let Err(e) = post_report(report, url, client).await {
            log::error!("Failed to post report to {url}: {e:#}");
            failures += 1;
        }
    }

    failures
}

async fn post_report(report: &Report, url: &str, client: &reqwest::Client) -> anyhow::Result<()> {
    let body = render_json(report)?;
    let response = client
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await?
        .error_for_status()?;
    log::info!("Report posted to {url} ({})", response.status());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn empty_report() -> Report {
        super::super::build_report(&[], &[], Utc::now(), 45)
    }

    #[tokio::test]
    async fn test_writes_report_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.txt");
        let targets = ReportTargets {
            format: ReportFormat::Text,
            file: Some(path.clone()),
            url: None,
        };

        let failures = emit_report(&empty_report(), &targets, &reqwest::Client::new()).await;
        assert_eq!(failures, 0);
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("Certificate report generated"));
    }

    #[tokio::test]
    async fn test_report_is_printed_with_logging_disabled() {
        log::set_max_level(log::LevelFilter::Off);
        let targets = ReportTargets {
            format: ReportFormat::Text,
            file: None,
            url: None,
        };

        let mut out = Vec::new();
        let failures =
            emit_report_to(&empty_report(), &targets, &reqwest::Client::new(), &mut out).await;

        assert_eq!(failures, 0);
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("Certificate report generated"));
    }

    #[tokio::test]
    async fn test_unwritable_file_is_counted_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let targets = ReportTargets {
            format: ReportFormat::Json,
            file: Some(dir.path().join("missing").join("report.json")),
            url: None,
        };
        let failures = emit_report(&empty_report(), &targets, &reqwest::Client::new()).await;
        assert_eq!(failures, 1);
    }
}
