//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    DEFAULT_CONCURRENCY, DEFAULT_SCAN_TIMEOUT_SECS, DEFAULT_THRESHOLD_DAYS, DEFAULT_TLS_PORT,
    MAX_SCAN_TIMEOUT_SECS, RETRY_MAX_ATTEMPTS, TCP_CONNECT_TIMEOUT_SECS,
    TLS_HANDSHAKE_TIMEOUT_SECS,
};
use crate::error_handling::SetupError;
use crate::models::Classification;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// TLS protocol versions accepted on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum TlsVersion {
    /// TLS 1.1
    #[value(name = "1.1")]
    Tls11,
    /// TLS 1.2
    #[value(name = "1.2")]
    Tls12,
    /// TLS 1.3
    #[value(name = "1.3")]
    Tls13,
}

impl std::fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TlsVersion::Tls11 => "TLSv1.1",
            TlsVersion::Tls12 => "TLSv1.2",
            TlsVersion::Tls13 => "TLSv1.3",
        };
        f.write_str(s)
    }
}

/// Where ingress objects are read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum IngressSourceKind {
    /// Kubernetes API (in-cluster config or kubeconfig)
    Kube,
    /// JSON document produced by `kubectl get ingress -A -o json`
    File,
}

/// Alert transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AlertSinkKind {
    /// POST a JSON message to a webhook URL (Slack-compatible `text` field)
    Webhook,
    /// Push a gauge to a Prometheus Pushgateway
    Pushgateway,
    /// Write alerts to the log only
    Log,
}

/// Report rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Pretty-printed JSON document
    Json,
    /// One line per host
    Text,
}

/// Exit code policy for completed runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FailOn {
    /// Always exit 0 once the report is produced (default)
    Never,
    /// Exit 2 if any host is expiring soon
    Expiring,
    /// Exit 2 if any host is not OK
    Any,
}

/// Scan configuration.
///
/// Parsed from the command line by `clap`, with environment variable fallbacks for
/// sink targets. Can also be constructed programmatically from [`Config::default`].
///
/// # Examples
///
/// ```bash
/// # In-cluster scan, alerting to a Slack webhook
/// ALERT_WEBHOOK_URL=https://hooks.slack.com/... ingress_validator
///
/// # Offline scan of a kubectl dump, text report, log-only alerts
/// ingress_validator --source file --ingress-file ingresses.json \
///     --report-format text --alert-sink log
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ingress_validator",
    about = "Checks TLS certificates of every ingress host and alerts on those nearing expiry."
)]
pub struct Config {
    /// Ingress source: kube|file
    #[arg(long, value_enum, default_value_t = IngressSourceKind::Kube)]
    pub source: IngressSourceKind,

    /// Ingress list JSON file (required with `--source file`)
    #[arg(long, env = "INGRESS_FILE")]
    pub ingress_file: Option<PathBuf>,

    /// Restrict the Kubernetes listing to one namespace (default: all namespaces)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Kubernetes label selector applied to the ingress listing
    #[arg(long)]
    pub selector: Option<String>,

    /// Minimum acceptable days of certificate validity
    #[arg(long, default_value_t = DEFAULT_THRESHOLD_DAYS, env = "THRESHOLD_DAYS")]
    pub threshold_days: i64,

    /// Port dialled on every host
    #[arg(long, default_value_t = DEFAULT_TLS_PORT)]
    pub port: u16,

    /// Lowest TLS version offered in the handshake: 1.1|1.2|1.3
    #[arg(long, value_enum, default_value_t = TlsVersion::Tls11)]
    pub min_tls_version: TlsVersion,

    /// Highest TLS version offered in the handshake: 1.1|1.2|1.3
    #[arg(long, value_enum, default_value_t = TlsVersion::Tls12)]
    pub max_tls_version: TlsVersion,

    /// Extra PEM bundle of trusted CA certificates (added to the webpki roots)
    #[arg(long)]
    pub ca_bundle: Option<PathBuf>,

    /// Maximum concurrent host inspections
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Deadline for the whole scan in seconds
    #[arg(long, default_value_t = DEFAULT_SCAN_TIMEOUT_SECS)]
    pub scan_timeout_secs: u64,

    /// TCP connect timeout per attempt in seconds
    #[arg(long, default_value_t = TCP_CONNECT_TIMEOUT_SECS)]
    pub connect_timeout_secs: u64,

    /// TLS handshake timeout per attempt in seconds
    #[arg(long, default_value_t = TLS_HANDSHAKE_TIMEOUT_SECS)]
    pub handshake_timeout_secs: u64,

    /// Extra attempts for unreachable hosts (exponential backoff)
    #[arg(long, default_value_t = 0)]
    pub retries: usize,

    /// Alert sink: webhook|pushgateway|log
    #[arg(long, value_enum, default_value_t = AlertSinkKind::Webhook)]
    pub alert_sink: AlertSinkKind,

    /// Webhook URL for alerts (alerting is disabled when absent)
    #[arg(long, env = "ALERT_WEBHOOK_URL")]
    pub alert_webhook_url: Option<String>,

    /// Prometheus Pushgateway base URL
    #[arg(long, env = "PUSHGATEWAY_URL")]
    pub pushgateway_url: Option<String>,

    /// Classifications that raise an alert (comma separated)
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_values_t = [Classification::ExpiringSoon]
    )]
    pub alert_on: Vec<Classification>,

    /// Report format: json|text
    #[arg(long, value_enum, default_value_t = ReportFormat::Json)]
    pub report_format: ReportFormat,

    /// Also write the report to this file
    #[arg(long)]
    pub report_file: Option<PathBuf>,

    /// Also POST the JSON report to this URL
    #[arg(long, env = "REPORT_URL")]
    pub report_url: Option<String>,

    /// Exit code policy: never|expiring|any
    #[arg(long, value_enum, default_value_t = FailOn::Never)]
    pub fail_on: FailOn,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: IngressSourceKind::Kube,
            ingress_file: None,
            namespace: None,
            selector: None,
            threshold_days: DEFAULT_THRESHOLD_DAYS,
            port: DEFAULT_TLS_PORT,
            min_tls_version: TlsVersion::Tls11,
            max_tls_version: TlsVersion::Tls12,
            ca_bundle: None,
            concurrency: DEFAULT_CONCURRENCY,
            scan_timeout_secs: DEFAULT_SCAN_TIMEOUT_SECS,
            connect_timeout_secs: TCP_CONNECT_TIMEOUT_SECS,
            handshake_timeout_secs: TLS_HANDSHAKE_TIMEOUT_SECS,
            retries: 0,
            alert_sink: AlertSinkKind::Webhook,
            alert_webhook_url: None,
            pushgateway_url: None,
            alert_on: vec![Classification::ExpiringSoon],
            report_format: ReportFormat::Json,
            report_file: None,
            report_url: None,
            fail_on: FailOn::Never,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

impl Config {
    /// Rejects option combinations that cannot produce a scan.
    ///
    /// # Errors
    ///
    /// Returns `SetupError::InvalidConfig` describing the first problem found.
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.concurrency == 0 {
            return Err(SetupError::InvalidConfig(
                "--concurrency must be at least 1".to_string(),
            ));
        }
        if self.threshold_days < 0 {
            return Err(SetupError::InvalidConfig(
                "--threshold-days must not be negative".to_string(),
            ));
        }
        if self.scan_timeout_secs == 0 || self.scan_timeout_secs > MAX_SCAN_TIMEOUT_SECS {
            return Err(SetupError::InvalidConfig(format!(
                "--scan-timeout-secs must be between 1 and {MAX_SCAN_TIMEOUT_SECS}"
            )));
        }
        if self.retries > RETRY_MAX_ATTEMPTS {
            return Err(SetupError::InvalidConfig(format!(
                "--retries must be at most {RETRY_MAX_ATTEMPTS}"
            )));
        }
        if self.min_tls_version > self.max_tls_version {
            return Err(SetupError::InvalidConfig(format!(
                "--min-tls-version {} is above --max-tls-version {}",
                self.min_tls_version, self.max_tls_version
            )));
        }
        if self.source == IngressSourceKind::File && self.ingress_file.is_none() {
            return Err(SetupError::InvalidConfig(
                "--source file requires --ingress-file".to_string(),
            ));
        }
        for (flag, value) in [
            ("--alert-webhook-url", &self.alert_webhook_url),
            ("--pushgateway-url", &self.pushgateway_url),
            ("--report-url", &self.report_url),
        ] {
            if let Some(value) = value {
                validate_http_url(flag, value)?;
            }
        }
        Ok(())
    }

    /// Deadline for the whole scan.
    pub fn scan_timeout(&self) -> Duration {
        Duration::from_secs(self.scan_timeout_secs)
    }
}

fn validate_http_url(flag: &str, value: &str) -> Result<(), SetupError> {
    let parsed = url::Url::parse(value)
        .map_err(|e| SetupError::InvalidConfig(format!("{flag} {value}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(SetupError::InvalidConfig(format!(
            "{flag} {value}: unsupported scheme '{other}'"
        ))),
    }
}
