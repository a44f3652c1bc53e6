//! Conversion driver implementation.
//!
//! Turns registered (input, output) pairs into converter jobs, drives the
//! scheduler until every job settles, and sorts inputs into converted and failed.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::classify::{classify, Verdict};
use super::config::ConverterConfig;
use super::error::DriverError;
use super::ticker::{FixedDelay, TickSource};
use super::types::{BatchReport, DriverState, FailureReason};
use crate::job::{CommandTemplate, Job, JobId, JobOutcome};
use crate::observer::{ConversionObserver, NoopObserver};
use crate::preflight::{run_preflight, PreflightConfig};
use crate::scheduler::{Scheduler, SchedulerConfig};

/// Bookkeeping of the batch currently in flight.
struct ActiveBatch {
    id: Uuid,
    started_at: DateTime<Utc>,
    clock: Instant,
    scheduler: Scheduler,
    jobs: HashMap<JobId, PathBuf>,
    remaining: BTreeSet<PathBuf>,
    already_converted: BTreeSet<PathBuf>,
    resolved: usize,
}

/// Batch converter driving one external process per input file.
///
/// A driver runs one batch at a time and can be reused once a batch finalizes.
pub struct ConversionDriver {
    converter: ConverterConfig,
    scheduler_config: SchedulerConfig,
    template: CommandTemplate,
    observer: Arc<dyn ConversionObserver>,
    work_set: BTreeMap<PathBuf, PathBuf>,
    converted: BTreeSet<PathBuf>,
    failed: BTreeMap<PathBuf, FailureReason>,
    state: DriverState,
    batch: Option<ActiveBatch>,
}

impl ConversionDriver {
    /// Creates a driver without checking the environment.
    pub fn new(converter: ConverterConfig, scheduler_config: SchedulerConfig) -> Self {
        let template = converter.template();
        info!(
            "Conversion driver created, converter is {}",
            template.program().display()
        );

        Self {
            converter,
            scheduler_config,
            template,
            observer: Arc::new(NoopObserver),
            work_set: BTreeMap::new(),
            converted: BTreeSet::new(),
            failed: BTreeMap::new(),
            state: DriverState::Idle,
            batch: None,
        }
    }

    /// Runs the preflight checks, then creates the driver.
    pub async fn preflighted(
        converter: ConverterConfig,
        scheduler_config: SchedulerConfig,
        preflight: &PreflightConfig,
    ) -> Result<Self, DriverError> {
        run_preflight(&converter, preflight).await?;
        Ok(Self::new(converter, scheduler_config))
    }

    /// Sets the observer receiving progress notifications.
    pub fn with_observer(mut self, observer: Arc<dyn ConversionObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Registered work, input to output.
    pub fn work_set(&self) -> &BTreeMap<PathBuf, PathBuf> {
        &self.work_set
    }

    /// Inputs of the running batch that have not settled yet.
    pub fn remaining(&self) -> impl Iterator<Item = &Path> {
        self.batch
            .iter()
            .flat_map(|b| b.remaining.iter().map(PathBuf::as_path))
    }

    /// Labels of the jobs currently running.
    pub fn running(&self) -> Vec<String> {
        self.batch
            .as_ref()
            .map(|b| b.scheduler.running_labels())
            .unwrap_or_default()
    }

    /// Queues `input` for conversion into `output` without starting anything.
    ///
    /// Registering the same input again replaces its output. Rejected while a
    /// batch is running.
    pub fn register(
        &mut self,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Result<(), DriverError> {
        if self.state != DriverState::Idle {
            return Err(DriverError::BatchInProgress(self.state));
        }

        let input = input.into();
        let output = output.into();
        if let Some(previous) = self.work_set.insert(input.clone(), output.clone()) {
            if previous != output {
                debug!(
                    "Output of {} changed from {} to {}",
                    input.display(),
                    previous.display(),
                    output.display()
                );
            }
        }
        Ok(())
    }

    /// Converts every registered file, pacing progress checks with the
    /// configured poll interval.
    ///
    /// Per-file failures never fail the batch; they are listed in the report.
    pub async fn run_batch(&mut self) -> Result<BatchReport, DriverError> {
        let mut ticker = FixedDelay::new(self.scheduler_config.poll_interval());
        self.run_batch_with(&mut ticker).await
    }

    /// Like [`run_batch`](Self::run_batch) with a caller supplied tick source.
    pub async fn run_batch_with<T>(&mut self, ticker: &mut T) -> Result<BatchReport, DriverError>
    where
        T: TickSource + ?Sized,
    {
        self.start_batch()?;

        loop {
            ticker.tick().await;
            if let Some(report) = self.check_progress().await? {
                return Ok(report);
            }
        }
    }

    /// Creates and submits the jobs of a new batch and starts the first ones.
    ///
    /// Inputs sharing an output with an earlier input of the batch fail with
    /// [`FailureReason::DuplicateOutput`] and get no job.
    ///
    /// For callers driving progress from their own event loop: call
    /// [`check_progress`](Self::check_progress) periodically afterwards until
    /// it returns a report.
    pub fn start_batch(&mut self) -> Result<(), DriverError> {
        if self.state != DriverState::Idle {
            warn!("Conversion batch requested while one is {}", self.state);
            return Err(DriverError::BatchInProgress(self.state));
        }

        self.converted.clear();
        self.failed.clear();

        let mut batch = ActiveBatch {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            clock: Instant::now(),
            scheduler: Scheduler::new(self.scheduler_config.admission_limit),
            jobs: HashMap::new(),
            remaining: BTreeSet::new(),
            already_converted: BTreeSet::new(),
            resolved: 0,
        };
        let mut claimed: HashMap<&Path, &Path> = HashMap::new();

        for (input, output) in &self.work_set {
            if output.is_file() {
                info!(
                    "{} already converted to {}",
                    input.display(),
                    output.display()
                );
                self.converted.insert(input.clone());
                batch.already_converted.insert(input.clone());
                continue;
            }

            // Two jobs writing one file would clean up each other's results.
            if let Some(owner) = claimed.get(output.as_path()) {
                let reason = FailureReason::DuplicateOutput {
                    output: output.clone(),
                    claimed_by: owner.to_path_buf(),
                };
                report_failure(input, "", &reason);
                self.failed.insert(input.clone(), reason);
                continue;
            }
            claimed.insert(output, input);

            info!("Converting {} to {}", input.display(), output.display());
            let command = self.template.render(input, output);
            debug!("Command: {}", command);

            let id = batch.scheduler.submit(Job::new(label_for(input), command));
            batch.jobs.insert(id, input.clone());
            batch.remaining.insert(input.clone());
        }

        batch.scheduler.advance();
        info!(batch = %batch.id, "{} files need conversion", batch.jobs.len());

        self.state = DriverState::Running;
        self.observer.on_converted_count(0);
        self.observer
            .on_running_changed(&batch.scheduler.running_labels());
        self.batch = Some(batch);
        Ok(())
    }

    /// Checks on the running jobs once, classifying the ones that finished.
    ///
    /// Returns the report when this check finalized the batch.
    pub async fn check_progress(&mut self) -> Result<Option<BatchReport>, DriverError> {
        if self.state != DriverState::Running {
            return Err(DriverError::NoActiveBatch);
        }
        let Some(batch) = self.batch.as_mut() else {
            return Err(DriverError::NoActiveBatch);
        };

        let outstanding = batch.scheduler.advance();

        for id in batch.scheduler.take_finished() {
            let Some(input) = batch.jobs.get(&id).cloned() else {
                error!(job = %id, "Finished job does not belong to this batch");
                continue;
            };
            let Some(job) = batch.scheduler.job_mut(id) else {
                error!(job = %id, "Finished job disappeared from the scheduler");
                continue;
            };

            let command = job.command().to_string();
            let outcome = job.result().await?;

            batch.remaining.remove(&input);
            debug!("{} files left to convert", batch.remaining.len());

            let output = self.work_set.get(&input).cloned().unwrap_or_default();
            match classify(
                &outcome,
                self.converter.unknown_exit_codes,
                self.template.program(),
            ) {
                Verdict::Converted => {
                    if let JobOutcome::Exited(result) = &outcome {
                        let stdout = result.stdout_lossy();
                        if !stdout.trim().is_empty() {
                            debug!("{}", stdout.trim());
                        }
                    }
                    info!("Converted {}", input.display());
                    self.converted.insert(input.clone());
                }
                Verdict::Failed { reason, cleanup } => {
                    report_failure(&input, &command, &reason);
                    if cleanup {
                        remove_partial_output(&output).await;
                    }
                    self.failed.insert(input.clone(), reason);
                }
            }

            batch.resolved += 1;
            let running = if batch.remaining.is_empty() {
                Vec::new()
            } else {
                batch.scheduler.running_labels()
            };
            self.observer.on_running_changed(&running);
            self.observer.on_converted_count(batch.resolved);
        }

        self.observer.on_progress_tick();

        if outstanding == 0 {
            return Ok(Some(self.finalize()));
        }
        Ok(None)
    }

    fn finalize(&mut self) -> BatchReport {
        self.state = DriverState::Finalizing;

        let (id, started_at, elapsed, already_converted) = match self.batch.take() {
            Some(batch) => (
                batch.id,
                batch.started_at,
                batch.clock.elapsed(),
                batch.already_converted,
            ),
            None => (Uuid::nil(), Utc::now(), Default::default(), BTreeSet::new()),
        };

        info!(
            batch = %id,
            "Total time taken by conversion {:.1} seconds",
            elapsed.as_secs_f64()
        );

        let report = BatchReport {
            batch_id: id,
            started_at,
            elapsed_ms: elapsed.as_millis() as u64,
            converted: std::mem::take(&mut self.converted),
            already_converted,
            failed: std::mem::take(&mut self.failed),
        };

        self.observer.on_batch_finished(&report);
        self.work_set.clear();
        self.state = DriverState::Idle;
        report
    }
}

/// Short label identifying an input in progress notifications.
fn label_for(input: &Path) -> String {
    input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string())
}

fn report_failure(input: &Path, command: &str, reason: &FailureReason) {
    match reason {
        FailureReason::ToolFailure { stderr, .. } | FailureReason::UnexpectedExit { stderr, .. } => {
            error!("File {} failed to convert: {}", input.display(), reason);
            error!("Command: {}", command);
            error!("Error message: {}", stderr);
        }
        FailureReason::ToolMissing { tool } => {
            error!("Converter not found at {}", tool.display());
        }
        FailureReason::DuplicateOutput { .. } => {
            error!("File {} was not converted: {}", input.display(), reason);
        }
        FailureReason::LaunchFailed { .. } | FailureReason::Lost { .. } => {
            error!("File {} failed to convert: {}", input.display(), reason);
            error!("Command: {}", command);
        }
    }
}

async fn remove_partial_output(output: &Path) {
    if !output.is_file() {
        return;
    }

    match tokio::fs::remove_file(output).await {
        Ok(()) => warn!("Removing failed conversion result: {}", output.display()),
        Err(e) => error!(
            "Failed to remove failed conversion result {}: {}",
            output.display(),
            e
        ),
    }
}
