//! Utility functions for host inspection.
//!
//! This module provides:
//! - Bounded retry of unreachable hosts

mod retry;

pub use retry::{inspect_with_retry, RetryOutcome};
