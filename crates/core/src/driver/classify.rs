//! Mapping of job outcomes onto conversion verdicts.
//!
//! Exit code contract of the converter: `0` success, `1` tool-reported failure,
//! `127` executable not found. Anything else follows [`UnknownExitPolicy`].

use std::path::Path;

use super::config::UnknownExitPolicy;
use super::types::FailureReason;
use crate::job::JobOutcome;

/// What to do with an input once its job has settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Converted,
    Failed {
        reason: FailureReason,
        /// Remove whatever the process left at the output path.
        cleanup: bool,
    },
}

/// Classifies a finished job. `tool` is the converter path, used in
/// `ToolMissing` reasons.
pub fn classify(outcome: &JobOutcome, policy: UnknownExitPolicy, tool: &Path) -> Verdict {
    match outcome {
        JobOutcome::Exited(result) => match result.exit_code {
            Some(0) => Verdict::Converted,
            Some(1) => Verdict::Failed {
                reason: FailureReason::ToolFailure {
                    exit_code: 1,
                    stderr: result.stderr_lossy().trim().to_string(),
                },
                cleanup: true,
            },
            Some(127) => Verdict::Failed {
                reason: FailureReason::ToolMissing {
                    tool: tool.to_path_buf(),
                },
                cleanup: false,
            },
            exit_code => match policy {
                UnknownExitPolicy::Success => Verdict::Converted,
                UnknownExitPolicy::Failure => Verdict::Failed {
                    reason: FailureReason::UnexpectedExit {
                        exit_code,
                        stderr: result.stderr_lossy().trim().to_string(),
                    },
                    cleanup: true,
                },
            },
        },
        JobOutcome::LaunchFailed(failure) if failure.is_not_found() => Verdict::Failed {
            reason: FailureReason::ToolMissing {
                tool: tool.to_path_buf(),
            },
            cleanup: false,
        },
        JobOutcome::LaunchFailed(failure) => Verdict::Failed {
            reason: FailureReason::LaunchFailed {
                message: failure.message.clone(),
            },
            cleanup: false,
        },
        // The child may still be alive and writing, so its output is left alone.
        JobOutcome::Lost(message) => Verdict::Failed {
            reason: FailureReason::Lost {
                message: message.clone(),
            },
            cleanup: false,
        },
    }
}
