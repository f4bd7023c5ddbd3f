//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (thresholds, timeouts, concurrency)
//! - CLI option types and parsing

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{
    AlertSinkKind, Config, FailOn, IngressSourceKind, LogFormat, LogLevel, ReportFormat,
    TlsVersion,
};
