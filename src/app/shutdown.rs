//! Ctrl-C handling.

use tokio_util::sync::CancellationToken;

/// Cancels `cancel` when the process receives Ctrl-C.
///
/// The returned task ends on its own once the token is cancelled by anyone else,
/// so callers can abort or drop it after the scan.
pub fn cancel_on_ctrl_c(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                match signal {
                    Ok(()) => {
                        log::warn!("Interrupted; abandoning pending hosts and reporting");
                        cancel.cancel();
                    }
                    Err(e) => log::warn!("Could not listen for Ctrl-C: {e}"),
                }
            }
            _ = cancel.cancelled() => {}
        }
    })
}

/// Stops the Ctrl-C listener once the scan is over.
pub async fn shutdown_gracefully(cancel: CancellationToken, listener: tokio::task::JoinHandle<()>) {
    cancel.cancel();
    let _ = listener.await;
}
