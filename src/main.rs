//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `ingress_validator` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - Exit codes
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use ingress_validator::config::EXIT_CODE_SETUP_FAILURE;
use ingress_validator::initialization::{init_crypto_provider, init_logger_with};
use ingress_validator::{run_scan, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    // Try the current directory first, then the executable's directory
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    // Parse command-line arguments into Config
    let config = Config::parse();

    // Initialize logger based on config
    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    // Kubernetes and HTTP clients need a process-wide crypto provider
    init_crypto_provider();

    let fail_on = config.fail_on;
    match run_scan(config).await {
        Ok(outcome) => {
            let code = outcome.exit_code(fail_on);
            if code != 0 {
                log::warn!("--fail-on {fail_on:?} matched; exiting with status {code}");
                process::exit(code);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("ingress_validator error: {:#}", e);
            process::exit(EXIT_CODE_SETUP_FAILURE);
        }
    }
}
