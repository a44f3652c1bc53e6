//! Types for the conversion driver.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a driver: `Idle -> Running -> Finalizing -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverState {
    Idle,
    Running,
    Finalizing,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Finalizing => "finalizing",
        };
        f.write_str(name)
    }
}

/// Why an input failed to convert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The converter ran and reported a failure (exit code 1).
    ToolFailure { exit_code: i32, stderr: String },

    /// The converter could not be found (exit code 127 or missing executable).
    ToolMissing { tool: PathBuf },

    /// The converter process could not be spawned for another reason.
    LaunchFailed { message: String },

    /// Exit code outside the known contract, or death by signal.
    UnexpectedExit {
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The process exit status could not be collected.
    Lost { message: String },

    /// Another input of the same batch already converts into this output.
    DuplicateOutput { output: PathBuf, claimed_by: PathBuf },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToolFailure { exit_code, .. } => {
                write!(f, "converter failed with exit code {}", exit_code)
            }
            Self::ToolMissing { tool } => write!(f, "converter not found at {}", tool.display()),
            Self::LaunchFailed { message } => write!(f, "could not start converter: {}", message),
            Self::UnexpectedExit {
                exit_code: Some(code),
                ..
            } => write!(f, "converter exited with unexpected code {}", code),
            Self::UnexpectedExit {
                exit_code: None, ..
            } => write!(f, "converter was terminated by a signal"),
            Self::Lost { message } => write!(f, "lost track of converter: {}", message),
            Self::DuplicateOutput { output, claimed_by } => write!(
                f,
                "output {} is already produced from {}",
                output.display(),
                claimed_by.display()
            ),
        }
    }
}

/// Result of one finalized batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    /// Inputs converted in this batch, including those already present on disk.
    pub converted: BTreeSet<PathBuf>,
    /// Subset of `converted` whose output existed before the batch started.
    pub already_converted: BTreeSet<PathBuf>,
    pub failed: BTreeMap<PathBuf, FailureReason>,
}

impl BatchReport {
    /// Whether every input converted.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total number of inputs covered by the report.
    pub fn total(&self) -> usize {
        self.converted.len() + self.failed.len()
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_ms as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_reason_display() {
        let reason = FailureReason::ToolMissing {
            tool: PathBuf::from("/opt/bftools/bfconvert"),
        };
        assert_eq!(
            reason.to_string(),
            "converter not found at /opt/bftools/bfconvert"
        );

        let reason = FailureReason::UnexpectedExit {
            exit_code: None,
            stderr: String::new(),
        };
        assert_eq!(reason.to_string(), "converter was terminated by a signal");

        let reason = FailureReason::DuplicateOutput {
            output: PathBuf::from("/cache/e06250156e.ome"),
            claimed_by: PathBuf::from("/data/a.oib"),
        };
        assert_eq!(
            reason.to_string(),
            "output /cache/e06250156e.ome is already produced from /data/a.oib"
        );
    }

    #[test]
    fn test_batch_report_serialization() {
        let mut report = BatchReport {
            batch_id: Uuid::new_v4(),
            started_at: Utc::now(),
            elapsed_ms: 1500,
            converted: BTreeSet::from([PathBuf::from("a.oib")]),
            already_converted: BTreeSet::new(),
            failed: BTreeMap::new(),
        };
        report.failed.insert(
            PathBuf::from("b.oib"),
            FailureReason::ToolFailure {
                exit_code: 1,
                stderr: "bad header".to_string(),
            },
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failed"]["b.oib"]["kind"], "tool_failure");
        assert_eq!(json["failed"]["b.oib"]["stderr"], "bad header");

        let parsed: BatchReport = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.total(), 2);
        assert!(!parsed.is_success());
        assert!((parsed.elapsed_secs() - 1.5).abs() < f64::EPSILON);
    }
}
