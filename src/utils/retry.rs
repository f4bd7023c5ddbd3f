//! Bounded retry around a single host inspection.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::error_handling::get_retry_strategy;
use crate::models::{Host, HostResult};
use crate::tls::Inspect;

/// Final inspection of a host, including retry count.
#[derive(Debug)]
pub struct RetryOutcome {
    /// The last result observed for the host.
    pub result: HostResult,
    /// The number of retry attempts made (not including the initial attempt).
    pub retry_count: u32,
}

/// Inspects `host`, retrying UNREACHABLE results up to `retries` extra times.
///
/// Protocol mismatches and successful handshakes are returned immediately since another
/// attempt would see the same server configuration. Delays follow
/// [`get_retry_strategy`]. The returned result is whatever the last attempt produced,
/// so callers see exactly the contract of [`Inspect::inspect`].
pub async fn inspect_with_retry(
    inspector: &dyn Inspect,
    host: &Host,
    retries: usize,
) -> RetryOutcome {
    let attempt_count = AtomicU32::new(0);
    let attempts = &attempt_count;

    let outcome = tokio_retry::RetryIf::spawn(
        get_retry_strategy(retries),
        move || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                let result = inspector.inspect(host).await;
                if result.is_retriable() {
                    Err(result)
                } else {
                    Ok(result)
                }
            }
        },
        |result: &HostResult| {
            log::debug!("Retrying {}: {:?}", result.host, result.inspection);
            true
        },
    )
    .await;

    let retry_count = attempt_count.load(Ordering::SeqCst).saturating_sub(1);
    let result = outcome.unwrap_or_else(|last| last);
    if retry_count > 0 {
        log::info!("{host}: finished after {retry_count} retries");
    }

    RetryOutcome {
        result,
        retry_count,
    }
}
