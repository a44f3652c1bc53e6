//! The job itself: one child process and its captured output.

use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::command::JobCommand;
use super::error::JobError;
use super::types::{JobId, JobOutcome, JobResult, JobState, LaunchFailure};

type Drain = JoinHandle<std::io::Result<Vec<u8>>>;

/// A spawned child together with the tasks draining its output pipes.
struct RunningProcess {
    child: Child,
    stdout: Option<Drain>,
    stderr: Option<Drain>,
}

/// How a job left the running state.
enum Completion {
    Exited(Option<i32>),
    LaunchFailed(LaunchFailure),
    Lost(String),
}

/// One external process invocation with its tracked lifecycle.
pub struct Job {
    id: JobId,
    label: String,
    command: JobCommand,
    state: JobState,
    process: Option<RunningProcess>,
    completion: Option<Completion>,
    output: Option<(Vec<u8>, Vec<u8>)>,
    started_at: Option<Instant>,
    runtime: Option<Duration>,
}

impl Job {
    /// Creates a pending job. `label` is a short human-readable identifier used
    /// in logs and progress notifications.
    pub fn new(label: impl Into<String>, command: JobCommand) -> Self {
        Self {
            id: JobId::generate(),
            label: label.into(),
            command,
            state: JobState::Pending,
            process: None,
            completion: None,
            output: None,
            started_at: None,
            runtime: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn command(&self) -> &JobCommand {
        &self.command
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Wall time between start and detected exit, once known.
    pub fn runtime(&self) -> Option<Duration> {
        self.runtime
    }

    /// Spawns the process and returns immediately.
    ///
    /// Both output streams are drained in the background so the child never
    /// blocks on a full pipe. If the spawn fails the job settles in `Done`
    /// carrying the launch failure and the error is returned.
    pub fn start(&mut self) -> Result<(), JobError> {
        if self.state != JobState::Pending {
            return Err(JobError::InvalidState {
                id: self.id,
                expected: JobState::Pending,
                actual: self.state,
            });
        }

        match self.command.to_command().spawn() {
            Ok(mut child) => {
                let stdout = child.stdout.take().map(drain);
                let stderr = child.stderr.take().map(drain);
                debug!(job = %self.id, pid = ?child.id(), "Started `{}`", self.command);

                self.process = Some(RunningProcess {
                    child,
                    stdout,
                    stderr,
                });
                self.started_at = Some(Instant::now());
                self.state = JobState::Running;
                Ok(())
            }
            Err(e) => {
                self.completion = Some(Completion::LaunchFailed(LaunchFailure::from(&e)));
                self.state = JobState::Done;
                Err(JobError::Launch {
                    command: self.command.to_string(),
                    source: e,
                })
            }
        }
    }

    /// Checks whether the process has exited without blocking.
    ///
    /// Returns `true` once the job is `Done`; the first `true` records the exit code.
    pub fn poll(&mut self) -> bool {
        match self.state {
            JobState::Pending => false,
            JobState::Done => true,
            JobState::Running => {
                let Some(process) = self.process.as_mut() else {
                    self.settle(Completion::Lost("process handle missing".to_string()));
                    return true;
                };

                match process.child.try_wait() {
                    Ok(Some(status)) => {
                        self.settle(Completion::Exited(status.code()));
                        true
                    }
                    Ok(None) => false,
                    Err(e) => {
                        warn!(job = %self.id, "Failed to query process status: {}", e);
                        self.settle(Completion::Lost(e.to_string()));
                        true
                    }
                }
            }
        }
    }

    fn settle(&mut self, completion: Completion) {
        self.runtime = self.started_at.map(|t| t.elapsed());
        self.completion = Some(completion);
        self.state = JobState::Done;
        debug!(job = %self.id, runtime = ?self.runtime, "Job finished");
    }

    /// Returns the outcome of a finished job.
    ///
    /// Collecting the buffered output waits for the drain tasks, which is bounded
    /// because the process has already exited. Repeated calls return the same outcome.
    pub async fn result(&mut self) -> Result<JobOutcome, JobError> {
        let code = match &self.completion {
            None => {
                return Err(JobError::InvalidState {
                    id: self.id,
                    expected: JobState::Done,
                    actual: self.state,
                })
            }
            Some(Completion::LaunchFailed(failure)) => {
                return Ok(JobOutcome::LaunchFailed(failure.clone()))
            }
            Some(Completion::Lost(reason)) => return Ok(JobOutcome::Lost(reason.clone())),
            Some(Completion::Exited(code)) => *code,
        };

        if self.output.is_none() {
            let (stdout, stderr) = match self.process.as_mut() {
                Some(process) => (
                    collect(self.id, "stdout", process.stdout.take()).await,
                    collect(self.id, "stderr", process.stderr.take()).await,
                ),
                None => (Vec::new(), Vec::new()),
            };
            self.output = Some((stdout, stderr));
        }

        let (stdout, stderr) = self.output.clone().unwrap_or_default();
        Ok(JobOutcome::Exited(JobResult {
            exit_code: code,
            stderr,
            stdout,
        }))
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("command", &self.command.to_string())
            .field("state", &self.state)
            .finish()
    }
}

fn drain<R>(mut reader: R) -> Drain
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    })
}

async fn collect(id: JobId, stream: &str, handle: Option<Drain>) -> Vec<u8> {
    let Some(handle) = handle else {
        return Vec::new();
    };

    match handle.await {
        Ok(Ok(buf)) => buf,
        Ok(Err(e)) => {
            warn!(job = %id, "Failed to read {}: {}", stream, e);
            Vec::new()
        }
        Err(e) => {
            warn!(job = %id, "{} reader task failed: {}", stream, e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sh(script: &str) -> JobCommand {
        JobCommand::new("sh").arg("-c").arg(script)
    }

    async fn wait_done(job: &mut Job) {
        for _ in 0..500 {
            if job.poll() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job did not finish in time");
    }

    #[tokio::test]
    async fn test_job_lifecycle() {
        let mut job = Job::new("echo", sh("echo out; echo err >&2; exit 0"));
        assert_eq!(job.state(), JobState::Pending);
        assert!(!job.poll());

        job.start().unwrap();
        assert_eq!(job.state(), JobState::Running);

        wait_done(&mut job).await;
        assert_eq!(job.state(), JobState::Done);
        assert!(job.runtime().is_some());

        let outcome = job.result().await.unwrap();
        let JobOutcome::Exited(result) = outcome else {
            panic!("expected exited outcome");
        };
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.stdout_lossy().trim(), "out");
        assert_eq!(result.stderr_lossy().trim(), "err");
    }

    #[tokio::test]
    async fn test_result_before_done_is_rejected() {
        let mut job = Job::new("sleep", sh("sleep 0.2"));
        assert!(matches!(
            job.result().await,
            Err(JobError::InvalidState { .. })
        ));

        job.start().unwrap();
        assert!(matches!(
            job.result().await,
            Err(JobError::InvalidState {
                actual: JobState::Running,
                ..
            })
        ));
        wait_done(&mut job).await;
    }

    #[tokio::test]
    async fn test_done_job_cannot_restart() {
        let mut job = Job::new("true", sh("exit 3"));
        job.start().unwrap();
        wait_done(&mut job).await;

        assert!(matches!(job.start(), Err(JobError::InvalidState { .. })));
        assert_eq!(job.state(), JobState::Done);
        assert!(job.poll());

        let first = job.result().await.unwrap();
        let second = job.result().await.unwrap();
        assert_eq!(first, second);
        assert!(matches!(first, JobOutcome::Exited(JobResult { exit_code: Some(3), .. })));
    }

    #[tokio::test]
    async fn test_launch_failure_settles_job() {
        let mut job = Job::new(
            "missing",
            JobCommand::new("/nonexistent/bftools/bfconvert").arg("in.oib"),
        );

        let err = job.start().unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(job.state(), JobState::Done);
        assert!(job.poll());

        match job.result().await.unwrap() {
            JobOutcome::LaunchFailed(failure) => assert!(failure.is_not_found()),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_large_output_does_not_stall() {
        // Far more than a pipe buffer holds.
        let mut job = Job::new("chatty", sh("head -c 1000000 /dev/zero"));
        job.start().unwrap();
        wait_done(&mut job).await;

        let JobOutcome::Exited(result) = job.result().await.unwrap() else {
            panic!("expected exited outcome");
        };
        assert_eq!(result.stdout.len(), 1_000_000);
    }
}
