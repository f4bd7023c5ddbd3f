//! Alert formatting and dispatch.
//!
//! Every report entry whose classification is in the alert policy becomes an
//! [`Alert`] sent to one [`AlertSink`]. Entries outside the policy are cleared from
//! sinks that keep state between runs. Sink failures are logged and counted; they
//! never abort the run.

mod sinks;

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::time::{timeout_at, Instant};

use crate::config::{AlertSinkKind, Config, DISPATCH_CONCURRENCY, DISPATCH_TIMEOUT_SECS};
use crate::error_handling::AlertError;
use crate::models::Classification;
use crate::report::{Report, ReportEntry};

pub use sinks::{LogSink, PushgatewaySink, UnconfiguredSink, WebhookSink};

/// One message for one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alert {
    /// Human-readable message; Slack renders this field.
    pub text: String,
    pub host: String,
    pub classification: Classification,
    pub days_remaining: Option<i64>,
}

impl Alert {
    pub fn from_entry(entry: &ReportEntry, threshold_days: i64) -> Self {
        Self {
            text: format_alert_message(entry, threshold_days),
            host: entry.host.clone(),
            classification: entry.classification,
            days_remaining: entry.days_remaining,
        }
    }
}

/// Formats the plain-text alert for a report entry.
///
/// Entries with a computed expiry read
/// `"<host>: certificate <subject> expires in N days (threshold T)"`; failures read
/// `"<host>: <CLASSIFICATION> - <reason>"`.
pub fn format_alert_message(entry: &ReportEntry, threshold_days: i64) -> String {
    match (&entry.failure_reason, entry.days_remaining) {
        (None, Some(days)) => format!(
            "{}: certificate {} expires in {} days (threshold {})",
            entry.host,
            entry.soonest_subject.as_deref().unwrap_or("(unknown subject)"),
            days,
            threshold_days
        ),
        (reason, _) => format!(
            "{}: {} - {}",
            entry.host,
            entry.classification,
            reason.as_deref().unwrap_or("no details")
        ),
    }
}

/// Alert transport.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Delivers one alert.
    async fn send(&self, alert: &Alert) -> Result<(), AlertError>;

    /// Withdraws whatever an earlier run published for `host`, which no longer
    /// alerts. Sinks without state have nothing to withdraw.
    async fn clear(&self, _host: &str) -> Result<(), AlertError> {
        Ok(())
    }
}

/// Outcome of one [`dispatch`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Sends an alert for every entry whose classification is in `alert_on`, and clears
/// every other entry from the sink.
///
/// At most `DISPATCH_CONCURRENCY` deliveries are in flight, and dispatch stops after
/// `DISPATCH_TIMEOUT_SECS`. Alerts still pending then count as failed.
pub async fn dispatch(
    report: &Report,
    sink: &dyn AlertSink,
    alert_on: &[Classification],
) -> DispatchSummary {
    let deadline = Instant::now() + Duration::from_secs(DISPATCH_TIMEOUT_SECS);
    let alerts: Vec<Alert> = report
        .entries_in(alert_on)
        .map(|entry| Alert::from_entry(entry, report.threshold_days))
        .collect();
    let mut summary = DispatchSummary {
        attempted: alerts.len(),
        ..Default::default()
    };

    let mut deliveries = stream::iter(alerts)
        .map(|alert| async move {
            let result = sink.send(&alert).await;
            (alert, result)
        })
        .buffer_unordered(DISPATCH_CONCURRENCY);

    loop {
        match timeout_at(deadline, deliveries.next()).await {
            Ok(Some((alert, Ok(())))) => {
                summary.delivered += 1;
                log::debug!("Alert for {} delivered via {}", alert.host, sink.name());
            }
            Ok(Some((alert, Err(e)))) => {
                log::warn!("Alert for {} not delivered via {}: {e}", alert.host, sink.name());
            }
            Ok(None) => break,
            Err(_) => {
                log::warn!(
                    "Alert dispatch timed out after {DISPATCH_TIMEOUT_SECS}s; {} alert(s) not delivered",
                    summary.attempted - summary.delivered
                );
                break;
            }
        }
    }
    summary.failed = summary.attempted - summary.delivered;

    let cleared: Vec<&str> = report
        .entries
        .iter()
        .filter(|entry| !alert_on.contains(&entry.classification))
        .map(|entry| entry.host.as_str())
        .collect();
    let mut clears = stream::iter(cleared)
        .map(|host| async move { (host, sink.clear(host).await) })
        .buffer_unordered(DISPATCH_CONCURRENCY);
    loop {
        match timeout_at(deadline, clears.next()).await {
            Ok(Some((host, Err(e)))) => {
                log::warn!("Could not clear {host} from {}: {e}", sink.name());
            }
            Ok(Some((_, Ok(())))) => {}
            Ok(None) => break,
            Err(_) => {
                log::warn!("Clearing hosts from {} timed out", sink.name());
                break;
            }
        }
    }

    if summary.attempted > 0 {
        log::info!(
            "Alerts: {} attempted, {} delivered, {} failed ({})",
            summary.attempted,
            summary.delivered,
            summary.failed,
            sink.name()
        );
    }

    summary
}

/// Builds the sink selected by `config`.
///
/// A webhook or Pushgateway sink without a URL becomes an [`UnconfiguredSink`], so
/// the scan still runs and reports; only delivery fails.
pub fn build_sink(config: &Config, client: reqwest::Client) -> Box<dyn AlertSink> {
    match config.alert_sink {
        AlertSinkKind::Log => Box::new(LogSink),
        AlertSinkKind::Webhook => match &config.alert_webhook_url {
            Some(url) => Box::new(WebhookSink::new(client, url.clone())),
            None => {
                log::warn!("No alert webhook URL configured; alerts will not be delivered");
                Box::new(UnconfiguredSink::new("webhook", "ALERT_WEBHOOK_URL"))
            }
        },
        AlertSinkKind::Pushgateway => match &config.pushgateway_url {
            Some(url) => Box::new(PushgatewaySink::new(client, url.clone())),
            None => {
                log::warn!("No Pushgateway URL configured; alerts will not be delivered");
                Box::new(UnconfiguredSink::new("pushgateway", "PUSHGATEWAY_URL"))
            }
        },
    }
}
