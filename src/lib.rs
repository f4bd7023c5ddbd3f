//! ingress_validator library: TLS certificate expiry checks for ingress hosts
//!
//! This library lists the ingress objects of a cluster (or a `kubectl` JSON dump),
//! dials every distinct rule host, inspects the verified certificate chain of each,
//! and alerts on certificates that expire within a threshold.
//!
//! # Example
//!
//! ```no_run
//! use ingress_validator::{run_scan, Config, IngressSourceKind};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     source: IngressSourceKind::File,
//!     ingress_file: Some(std::path::PathBuf::from("ingresses.json")),
//!     threshold_days: 30,
//!     ..Default::default()
//! };
//!
//! let outcome = run_scan(config).await?;
//! println!("Checked {} hosts, {} alerts sent",
//!          outcome.report.entries.len(), outcome.alerts.delivered);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod alert;
mod app;
pub mod config;
mod error_handling;
pub mod evaluate;
pub mod hosts;
pub mod ingress;
pub mod initialization;
pub mod models;
pub mod report;
mod run;
pub mod tls;
mod utils;

// Re-export public API
pub use alert::{dispatch, Alert, AlertSink, DispatchSummary};
pub use config::{Config, FailOn, IngressSourceKind, LogFormat, LogLevel};
pub use error_handling::{AlertError, InitializationError, SetupError};
pub use models::{Certificate, Classification, FailureKind, Host, HostResult, Inspection};
pub use run::{
    inspect_all, run_scan, run_scan_with, ScanOutcome, ScanParams, DEADLINE_EXCEEDED_REASON,
    SCAN_CANCELLED_REASON,
};
pub use utils::{inspect_with_retry, RetryOutcome};
