//! Error handling.
//!
//! This module provides:
//! - Error type definitions for setup, initialization, and alert delivery
//! - Handshake error categorization into per-host failure kinds
//! - Retry strategy configuration
//!
//! Only setup errors abort a run; everything that goes wrong for a single host is
//! captured on that host's result.

mod categorization;
mod types;

// Re-export public API
pub use categorization::{
    categorize_handshake_error, describe_handshake_error, get_retry_strategy,
    HandshakeErrorKind,
};
pub use types::{AlertError, InitializationError, SetupError};
