//! Application initialization and resource setup.
//!
//! This module provides functions to initialize shared resources:
//! - Logger
//! - TLS client configuration for the certificate inspector
//! - HTTP client for alert and report sinks
//! - Concurrency semaphore

mod client;
mod logger;
mod tls;

use std::sync::Arc;

use rustls::crypto::{ring::default_provider, CryptoProvider};
use tokio::sync::Semaphore;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;
pub use tls::{
    build_tls_config, init_root_store, init_tls_config, supported_protocol_versions, InspectorTls,
    TrustStore,
};

/// Initializes a semaphore for controlling concurrency.
///
/// Limits the number of host inspections in flight at once.
pub fn init_semaphore(count: usize) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(count))
}

/// Initializes the process-wide crypto provider for TLS operations.
///
/// The inspector passes its provider explicitly, but the Kubernetes and HTTP clients
/// build their own rustls configurations and need a default installed.
pub fn init_crypto_provider() {
    // The return value is ignored because reinstalling the provider is harmless
    let _ = CryptoProvider::install_default(default_provider());
}
