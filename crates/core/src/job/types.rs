//! Types describing a job's identity, lifecycle and result.

use std::borrow::Cow;
use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(Uuid);

impl JobId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let simple = self.0.simple().to_string();
        write!(f, "job-{}", &simple[..8])
    }
}

/// Lifecycle state of a job.
///
/// States only move forward: `Pending -> Running -> Done`. A job whose process
/// cannot be spawned goes straight from `Pending` to `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Done,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Exit code and captured output of a finished process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobResult {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stderr: Vec<u8>,
    pub stdout: Vec<u8>,
}

impl JobResult {
    /// Whether the process exited with code 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn stderr_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }

    pub fn stdout_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }
}

/// Why a process could not be spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchFailure {
    pub kind: io::ErrorKind,
    pub message: String,
}

impl LaunchFailure {
    /// The executable does not exist at the given location.
    pub fn is_not_found(&self) -> bool {
        self.kind == io::ErrorKind::NotFound
    }
}

impl From<&io::Error> for LaunchFailure {
    fn from(err: &io::Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Final outcome of a settled job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The process ran and exited.
    Exited(JobResult),
    /// The process never started.
    LaunchFailed(LaunchFailure),
    /// The process started but its exit status could not be collected.
    Lost(String),
}
