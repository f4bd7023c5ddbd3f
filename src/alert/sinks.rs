//! Alert sink implementations.

use async_trait::async_trait;

use crate::config::PUSHGATEWAY_JOB;
use crate::error_handling::AlertError;

use super::{Alert, AlertSink};

/// Writes alerts through the logger.
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, alert: &Alert) -> Result<(), AlertError> {
        log::warn!("ALERT {}", alert.text);
        Ok(())
    }
}

/// POSTs each alert as JSON to a webhook.
///
/// The body carries `text` (what Slack incoming webhooks display) plus the structured
/// `host`, `classification`, and `days_remaining` fields.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, alert: &Alert) -> Result<(), AlertError> {
        let response = self.client.post(&self.url).json(alert).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// Pushes a days-remaining gauge per host to a Prometheus Pushgateway.
///
/// Each host gets its own grouping key (`instance=<host>`), so pushes for different
/// hosts do not overwrite each other. A host that stops alerting has its group
/// deleted, so the gateway never keeps serving a value from an earlier run.
pub struct PushgatewaySink {
    client: reqwest::Client,
    base_url: String,
}

impl PushgatewaySink {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn push_url(&self, host: &str) -> String {
        format!(
            "{}/metrics/job/{PUSHGATEWAY_JOB}/instance/{host}",
            self.base_url
        )
    }
}

/// Renders one alert in the Prometheus text exposition format.
pub fn exposition(alert: &Alert) -> String {
    let value = alert
        .days_remaining
        .map(|d| d.to_string())
        .unwrap_or_else(|| "NaN".to_string());
    format!(
        "# TYPE ingress_certificate_days_remaining gauge\n\
         ingress_certificate_days_remaining{{host=\"{}\",classification=\"{}\"}} {}\n",
        escape_label(&alert.host),
        alert.classification,
        value
    )
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[async_trait]
impl AlertSink for PushgatewaySink {
    fn name(&self) -> &'static str {
        "pushgateway"
    }

    async fn send(&self, alert: &Alert) -> Result<(), AlertError> {
        let response = self
            .client
            .post(self.push_url(&alert.host))
            .header(reqwest::header::CONTENT_TYPE, "text/plain; version=0.0.4")
            .body(exposition(alert))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Status(status.as_u16()));
        }
        Ok(())
    }

    async fn clear(&self, host: &str) -> Result<(), AlertError> {
        let response = self.client.delete(self.push_url(host)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// Stands in for a selected sink whose target is missing. Every send fails.
pub struct UnconfiguredSink {
    sink: &'static str,
    missing: &'static str,
}

impl UnconfiguredSink {
    pub fn new(sink: &'static str, missing: &'static str) -> Self {
        Self { sink, missing }
    }
}

#[async_trait]
impl AlertSink for UnconfiguredSink {
    fn name(&self) -> &'static str {
        "unconfigured"
    }

    async fn send(&self, _alert: &Alert) -> Result<(), AlertError> {
        Err(AlertError::NotConfigured {
            sink: self.sink,
            missing: self.missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Classification;
    use wiremock::matchers::{body_json, body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn alert() -> Alert {
        Alert {
            text: "a.com: certificate CN=a.com expires in 5 days (threshold 45)".to_string(),
            host: "a.com".to_string(),
            classification: Classification::ExpiringSoon,
            days_remaining: Some(5),
        }
    }

    #[tokio::test]
    async fn test_webhook_posts_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_json(serde_json::json!({
                "text": "a.com: certificate CN=a.com expires in 5 days (threshold 45)",
                "host": "a.com",
                "classification": "EXPIRING-SOON",
                "days_remaining": 5
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sink = WebhookSink::new(reqwest::Client::new(), format!("{}/hook", server.uri()));
        sink.send(&alert()).await.unwrap();
    }

    #[tokio::test]
    async fn test_webhook_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let sink = WebhookSink::new(reqwest::Client::new(), server.uri());
        let err = sink.send(&alert()).await.unwrap_err();
        assert!(matches!(err, AlertError::Status(500)));
    }

    #[tokio::test]
    async fn test_pushgateway_grouping_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/metrics/job/ingress_validator/instance/a.com"))
            .and(body_string_contains(
                "ingress_certificate_days_remaining{host=\"a.com\",classification=\"EXPIRING-SOON\"} 5",
            ))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sink = PushgatewaySink::new(reqwest::Client::new(), format!("{}/", server.uri()));
        sink.send(&alert()).await.unwrap();
    }

    #[tokio::test]
    async fn test_pushgateway_group_deleted_after_renewal() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/metrics/job/ingress_validator/instance/a.com"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let renewed = crate::report::Report {
            generated_at: chrono::Utc::now(),
            threshold_days: 45,
            entries: vec![crate::report::ReportEntry {
                host: "a.com".to_string(),
                port: 443,
                classification: Classification::Ok,
                days_remaining: Some(89),
                soonest_subject: Some("CN=a.com".to_string()),
                failure_reason: None,
                tls_version: Some("TLSv1.2".to_string()),
                certificates: Vec::new(),
            }],
        };
        let sink = PushgatewaySink::new(reqwest::Client::new(), server.uri());
        let summary =
            crate::alert::dispatch(&renewed, &sink, &[Classification::ExpiringSoon]).await;
        assert_eq!(summary.attempted, 0);
    }

    #[test]
    fn test_exposition_without_days_is_nan() {
        let alert = Alert {
            text: "b.com: UNREACHABLE - timeout".to_string(),
            host: "b.com".to_string(),
            classification: Classification::Unreachable,
            days_remaining: None,
        };
        assert!(exposition(&alert).ends_with("} NaN\n"));
    }

    #[tokio::test]
    async fn test_log_sink_always_succeeds() {
        assert!(LogSink.send(&alert()).await.is_ok());
    }
}
