//! Error type definitions.
//!
//! Only [`SetupError`] ever ends a run. Per-host failures are recorded as data on the
//! host result, and alert delivery failures are logged by the dispatcher.

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Fatal failures that prevent a scan from starting.
#[derive(Error, Debug)]
pub enum SetupError {
    /// Option combination that cannot produce a scan.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No cluster credentials could be loaded.
    #[error("Failed to create Kubernetes client: {0}")]
    ClusterClient(#[source] kube::Error),

    /// The ingress listing call failed.
    #[error("Failed to list ingresses: {0}")]
    ListIngresses(#[source] kube::Error),

    /// The ingress file could not be read.
    #[error("Failed to read ingress file {path}: {source}")]
    IngressFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The ingress file is not an ingress list document.
    #[error("Failed to parse ingress file {path}: {source}")]
    IngressFileParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured version range contains no version the TLS stack can speak.
    #[error("No supported TLS version between {min} and {max} (supported: TLSv1.2, TLSv1.3)")]
    UnsupportedTlsRange { min: String, max: String },

    /// The TLS client configuration was rejected.
    #[error("TLS configuration error: {0}")]
    TlsConfig(#[from] rustls::Error),

    /// The CA bundle could not be loaded.
    #[error("Failed to load CA bundle {path}: {reason}")]
    CaBundle { path: String, reason: String },

    /// An HTTP client for a sink could not be built.
    #[error("HTTP client initialization error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Reasons an alert could not be delivered. Never escalated to a run failure.
#[derive(Error, Debug)]
pub enum AlertError {
    /// The selected sink has no target configured.
    #[error("alert sink '{sink}' is not configured: {missing}")]
    NotConfigured {
        sink: &'static str,
        missing: &'static str,
    },

    /// The request could not be sent.
    #[error("alert request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The sink answered with a non-success status.
    #[error("alert sink responded with HTTP {0}")]
    Status(u16),
}
