//! Run statistics computed from the finished report.

use log::info;
use strum::IntoEnumIterator;

use crate::alert::DispatchSummary;
use crate::models::Classification;
use crate::report::Report;

/// Per-classification host counts, in [`Classification`] declaration order.
pub fn classification_counts(report: &Report) -> Vec<(Classification, usize)> {
    Classification::iter()
        .map(|classification| (classification, report.count(classification)))
        .collect()
}

/// Logs a one-line summary followed by the non-zero classification counts.
pub fn print_final_statistics(report: &Report, alerts: &DispatchSummary, elapsed_seconds: f64) {
    let total = report.entries.len();
    info!(
        "✅ Checked {} host{} in {:.1}s ({} alert{} sent, {} failed)",
        total,
        if total == 1 { "" } else { "s" },
        elapsed_seconds,
        alerts.delivered,
        if alerts.delivered == 1 { "" } else { "s" },
        alerts.failed
    );

    for (classification, count) in classification_counts(report) {
        if count > 0 {
            info!("   {classification}: {count}");
        }
    }
}
