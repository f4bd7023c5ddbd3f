//! Concurrent inspection of every host in a run.
//!
//! Each host is inspected in its own Tokio task. A semaphore bounds how many
//! handshakes are in flight, one deadline bounds the whole scan, and a cancellation
//! token lets Ctrl-C end it early. Results land in a slot per host so the output
//! order matches the input order no matter which task finishes first.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::initialization::init_semaphore;
use crate::models::{Host, HostResult};
use crate::tls::Inspect;
use crate::utils::inspect_with_retry;

/// Failure reason for hosts still pending when the scan deadline passes.
pub const DEADLINE_EXCEEDED_REASON: &str = "scan deadline exceeded";
/// Failure reason for hosts still pending when the scan is cancelled.
pub const SCAN_CANCELLED_REASON: &str = "scan cancelled";

/// Used when a timeout is too large to add to the current instant.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `start + timeout`, saturating to a far-future instant instead of overflowing.
pub fn scan_deadline(start: Instant, timeout: Duration) -> Instant {
    start
        .checked_add(timeout)
        .or_else(|| start.checked_add(FAR_FUTURE))
        .unwrap_or(start)
}

/// Knobs for one call to [`inspect_all`].
#[derive(Debug, Clone)]
pub struct ScanParams {
    /// Maximum number of inspections in flight.
    pub concurrency: usize,
    /// Point in time after which pending inspections are abandoned.
    pub deadline: Instant,
    /// Extra attempts for unreachable hosts.
    pub retries: usize,
    pub cancel: CancellationToken,
}

/// Inspects `hosts` concurrently and returns one result per host, in input order.
///
/// Never fails: hosts that could not be inspected before the deadline or before
/// cancellation are reported as unreachable with a reason saying which.
pub async fn inspect_all(
    inspector: Arc<dyn Inspect>,
    hosts: &[Host],
    params: ScanParams,
) -> Vec<HostResult> {
    let semaphore = init_semaphore(params.concurrency.max(1));
    let mut tasks = FuturesUnordered::new();

    for (index, host) in hosts.iter().cloned().enumerate() {
        let inspector = Arc::clone(&inspector);
        let semaphore = Arc::clone(&semaphore);
        let cancel = params.cancel.clone();
        let deadline = params.deadline;
        let retries = params.retries;

        tasks.push(tokio::spawn(async move {
            let result = inspect_one(inspector, semaphore, &host, deadline, retries, cancel).await;
            (index, result)
        }));
    }

    let total = hosts.len();
    let mut slots: Vec<Option<HostResult>> = (0..total).map(|_| None).collect();
    let mut completed = 0usize;

    while let Some(task_result) = tasks.next().await {
        match task_result {
            Ok((index, result)) => {
                completed += 1;
                log::debug!("[{completed}/{total}] {} inspected", result.host);
                if let Some(slot) = slots.get_mut(index) {
                    *slot = Some(result);
                }
            }
            Err(join_error) => {
                log::warn!("Inspection task panicked: {join_error:?}");
            }
        }
    }

    slots
        .into_iter()
        .zip(hosts)
        .map(|(slot, host)| {
            slot.unwrap_or_else(|| HostResult::unreachable(host.clone(), "inspection task failed"))
        })
        .collect()
}

async fn inspect_one(
    inspector: Arc<dyn Inspect>,
    semaphore: Arc<Semaphore>,
    host: &Host,
    deadline: Instant,
    retries: usize,
    cancel: CancellationToken,
) -> HostResult {
    // Waiting for a permit counts against the deadline too.
    let work = async {
        let _permit = match semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => return HostResult::unreachable(host.clone(), SCAN_CANCELLED_REASON),
        };
        inspect_with_retry(inspector.as_ref(), host, retries).await.result
    };

    tokio::select! {
        outcome = tokio::time::timeout_at(deadline, work) => match outcome {
            Ok(result) => result,
            Err(_) => {
                log::warn!("{host}: {DEADLINE_EXCEEDED_REASON}");
                HostResult::unreachable(host.clone(), DEADLINE_EXCEEDED_REASON)
            }
        },
        _ = cancel.cancelled() => {
            log::warn!("{host}: {SCAN_CANCELLED_REASON}");
            HostResult::unreachable(host.clone(), SCAN_CANCELLED_REASON)
        }
    }
}
