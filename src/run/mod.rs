//! Scan orchestration.
//!
//! [`run_scan`] wires the pipeline together: list ingresses, extract hosts, inspect
//! them concurrently, evaluate, report, and alert. Only setup problems return an
//! error; everything that goes wrong with an individual host ends up in the report.

mod scan;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use log::info;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::alert::{build_sink, dispatch, AlertSink, DispatchSummary};
use crate::app::{cancel_on_ctrl_c, print_final_statistics, shutdown_gracefully};
use crate::config::{Config, FailOn, EXIT_CODE_POLICY_TRIGGERED};
use crate::evaluate::evaluate;
use crate::hosts::extract_hosts;
use crate::ingress::{build_source, IngressSource};
use crate::initialization::{init_client, init_tls_config};
use crate::models::Classification;
use crate::report::{build_report, emit_report, Report, ReportTargets};
use crate::tls::{Inspect, TlsInspector};

pub use scan::{
    inspect_all, scan_deadline, ScanParams, DEADLINE_EXCEEDED_REASON, SCAN_CANCELLED_REASON,
};

/// Result of a completed scan.
#[derive(Debug)]
pub struct ScanOutcome {
    pub report: Report,
    pub alerts: DispatchSummary,
    /// Report targets (file, URL) that could not be written.
    pub report_failures: usize,
    pub elapsed_seconds: f64,
}

impl ScanOutcome {
    /// Process exit code for this outcome under `policy`.
    ///
    /// `0` unless the policy matches, then [`EXIT_CODE_POLICY_TRIGGERED`].
    pub fn exit_code(&self, policy: FailOn) -> i32 {
        let triggered = match policy {
            FailOn::Never => false,
            FailOn::Expiring => self.report.count(Classification::ExpiringSoon) > 0,
            FailOn::Any => self
                .report
                .entries
                .iter()
                .any(|entry| entry.classification != Classification::Ok),
        };
        if triggered {
            EXIT_CODE_POLICY_TRIGGERED
        } else {
            0
        }
    }
}

/// Runs a full scan with the ingress source, inspector, and sinks `config` selects.
///
/// # Errors
///
/// Returns an error for invalid configuration, an unreachable or unreadable ingress
/// source, or an unusable TLS configuration. Per-host failures never surface here.
pub async fn run_scan(config: Config) -> Result<ScanOutcome> {
    config.validate().context("Invalid configuration")?;

    let tls_config = init_tls_config(&config).context("Failed to initialize TLS configuration")?;
    let inspector: Arc<dyn Inspect> = Arc::new(TlsInspector::new(
        tls_config,
        Duration::from_secs(config.connect_timeout_secs),
        Duration::from_secs(config.handshake_timeout_secs),
    ));

    let client = init_client().context("Failed to initialize HTTP client")?;
    let sink = build_sink(&config, client.clone());

    let source = build_source(&config)
        .await
        .context("Failed to initialize ingress source")?;

    run_scan_with(
        &config,
        source.as_ref(),
        inspector,
        sink.as_ref(),
        &client,
    )
    .await
}

/// Runs a scan against explicit collaborators.
///
/// Library callers and tests use this to plug in their own source, inspector, or
/// sink. `config` supplies every other setting.
///
/// # Errors
///
/// Returns an error only when the ingress source fails.
pub async fn run_scan_with(
    config: &Config,
    source: &dyn IngressSource,
    inspector: Arc<dyn Inspect>,
    sink: &dyn AlertSink,
    client: &reqwest::Client,
) -> Result<ScanOutcome> {
    let start_time = std::time::Instant::now();

    info!("Listing ingresses from {}", source.describe());
    let ingresses = source
        .list_ingresses()
        .await
        .context("Failed to list ingresses")?;

    let hosts = extract_hosts(&ingresses, config.port);
    info!(
        "Found {} distinct host{} in {} ingress{}",
        hosts.len(),
        if hosts.len() == 1 { "" } else { "s" },
        ingresses.len(),
        if ingresses.len() == 1 { "" } else { "es" }
    );

    let cancel = CancellationToken::new();
    let ctrl_c = cancel_on_ctrl_c(cancel.clone());

    let params = ScanParams {
        concurrency: config.concurrency,
        deadline: scan_deadline(Instant::now(), config.scan_timeout()),
        retries: config.retries,
        cancel: cancel.child_token(),
    };
    let results = inspect_all(inspector, &hosts, params).await;

    shutdown_gracefully(cancel, ctrl_c).await;

    let now = Utc::now();
    let evaluations: Vec<_> = results
        .iter()
        .map(|result| evaluate(result, now, config.threshold_days))
        .collect();
    let report = build_report(&results, &evaluations, now, config.threshold_days);

    let report_failures = emit_report(&report, &ReportTargets::from(config), client).await;
    let alerts = dispatch(&report, sink, &config.alert_on).await;

    let elapsed_seconds = start_time.elapsed().as_secs_f64();
    print_final_statistics(&report, &alerts, elapsed_seconds);

    Ok(ScanOutcome {
        report,
        alerts,
        report_failures,
        elapsed_seconds,
    })
}
