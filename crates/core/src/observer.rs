//! Progress notifications out of the conversion driver.
//!
//! The driver never depends on a UI or event loop; anything that wants to show
//! progress implements [`ConversionObserver`] and is handed to the driver.
//! Callbacks run on the task driving the batch, so they should return quickly.

use tracing::info;

use crate::driver::BatchReport;

/// Receives progress notifications from a running batch.
///
/// Every method has a no-op default.
pub trait ConversionObserver: Send + Sync {
    /// The set of running jobs changed. `running` holds the labels (input file
    /// names) of jobs still in flight; it is empty once nothing is left to convert.
    fn on_running_changed(&self, _running: &[String]) {}

    /// A progress check completed.
    fn on_progress_tick(&self) {}

    /// `resolved` inputs of the current batch have settled so far, successfully
    /// or not. Emitted with `0` when a batch starts.
    fn on_converted_count(&self, _resolved: usize) {}

    /// The batch finalized.
    fn on_batch_finished(&self, _report: &BatchReport) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ConversionObserver for NoopObserver {}

/// Observer that reports progress through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver;

impl ConversionObserver for LoggingObserver {
    fn on_running_changed(&self, running: &[String]) {
        if running.is_empty() {
            info!("No conversions running");
        } else {
            info!("Converting: {}", running.join(", "));
        }
    }

    fn on_converted_count(&self, resolved: usize) {
        info!("{} files processed", resolved);
    }

    fn on_batch_finished(&self, report: &BatchReport) {
        info!(
            "Batch finished: {} converted, {} failed in {:.1} seconds",
            report.converted.len(),
            report.failed.len(),
            report.elapsed_secs()
        );
    }
}
