//! HTTP client initialization for alert and report sinks.

use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::SINK_REQUEST_TIMEOUT_SECS;
use crate::error_handling::SetupError;

/// Initializes the HTTP client shared by the webhook, Pushgateway, and report sinks.
///
/// # Errors
///
/// Returns `SetupError::HttpClient` if client creation fails.
pub fn init_client() -> Result<reqwest::Client, SetupError> {
    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(SINK_REQUEST_TIMEOUT_SECS))
        .user_agent(concat!("ingress_validator/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_client() {
        assert!(init_client().is_ok());
    }

    #[test]
    fn test_reqwest_errors_become_setup_errors() {
        let err = reqwest::Client::new()
            .get("not a url")
            .build()
            .expect_err("relative URL must not build");
        let setup: SetupError = err.into();
        assert!(matches!(setup, SetupError::HttpClient(_)));
        assert!(setup
            .to_string()
            .starts_with("HTTP client initialization error"));
    }
}
