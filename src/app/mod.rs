//! Main application modules.
//!
//! This module provides Ctrl-C handling and statistics printing used by the scan
//! orchestration.

pub mod shutdown;
pub mod statistics;

// Re-export public API
pub use shutdown::{cancel_on_ctrl_c, shutdown_gracefully};
pub use statistics::print_final_statistics;
