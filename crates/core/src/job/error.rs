//! Error types for the job module.

use thiserror::Error;

use super::types::{JobId, JobState};

/// Errors raised while driving a single job.
#[derive(Debug, Error)]
pub enum JobError {
    /// The process image could not be spawned.
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The operation is not valid in the job's current state.
    #[error("{id} is {actual}, expected {expected}")]
    InvalidState {
        id: JobId,
        expected: JobState,
        actual: JobState,
    },
}

impl JobError {
    /// Whether the launch failed because the executable does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Launch { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
