//! Error types for the conversion driver.

use thiserror::Error;

use super::types::DriverState;
use crate::job::JobError;
use crate::preflight::PreflightError;

/// Errors that stop the driver from doing what was asked.
///
/// Per-file conversion failures are not errors; they are reported in the
/// [`BatchReport`](super::BatchReport).
#[derive(Debug, Error)]
pub enum DriverError {
    /// A batch is already running on this driver.
    #[error("a conversion batch is already {0}")]
    BatchInProgress(DriverState),

    /// There is no batch to make progress on.
    #[error("no conversion batch is running")]
    NoActiveBatch,

    /// The environment is not fit for conversion.
    #[error("preflight check failed: {0}")]
    Preflight(#[from] PreflightError),

    /// A job could not be inspected.
    #[error("job error: {0}")]
    Job(#[from] JobError),
}
