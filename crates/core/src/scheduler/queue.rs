//! Backlog / running / done bookkeeping.

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::job::{Job, JobId};

/// Sizes of the scheduler's three collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SchedulerCounts {
    pub backlog: usize,
    pub running: usize,
    pub done: usize,
    pub total: usize,
}

/// Runs submitted jobs with at most `admission_limit` of them in flight.
///
/// Every submitted job lives in exactly one of `backlog`, `running` or `done`.
/// Start order is not part of the contract.
#[derive(Debug)]
pub struct Scheduler {
    admission_limit: usize,
    backlog: Vec<Job>,
    running: Vec<Job>,
    done: Vec<Job>,
    total: usize,
    finished: Vec<JobId>,
}

impl Scheduler {
    /// Creates an empty scheduler. A limit of 0 is raised to 1.
    pub fn new(admission_limit: usize) -> Self {
        if admission_limit == 0 {
            warn!("Admission limit of 0 would never start a job, using 1");
        }

        Self {
            admission_limit: admission_limit.max(1),
            backlog: Vec::new(),
            running: Vec::new(),
            done: Vec::new(),
            total: 0,
            finished: Vec::new(),
        }
    }

    pub fn admission_limit(&self) -> usize {
        self.admission_limit
    }

    /// Adds a pending job to the backlog.
    pub fn submit(&mut self, job: Job) -> JobId {
        let id = job.id();
        debug!(job = %id, label = job.label(), "Job queued");
        self.backlog.push(job);
        self.total += 1;
        id
    }

    /// Polls running jobs, admits new ones, and reports outstanding work.
    ///
    /// Returns `0` once every submitted job is done, otherwise the number of
    /// jobs still running or waiting in the backlog.
    pub fn advance(&mut self) -> usize {
        let mut i = 0;
        while i < self.running.len() {
            if self.running[i].poll() {
                let job = self.running.swap_remove(i);
                debug!(job = %job.id(), label = job.label(), "Job done");
                self.finished.push(job.id());
                self.done.push(job);
            } else {
                i += 1;
            }
        }

        while self.running.len() < self.admission_limit {
            let Some(mut job) = self.backlog.pop() else {
                break;
            };

            match job.start() {
                Ok(()) => self.running.push(job),
                Err(e) => {
                    warn!(job = %job.id(), label = job.label(), "{}", e);
                    self.finished.push(job.id());
                    self.done.push(job);
                }
            }
        }

        self.check_invariants();

        debug!(
            "{} running, {} queued, {} done",
            self.running.len(),
            self.backlog.len(),
            self.done.len()
        );

        if self.done.len() == self.total {
            0
        } else {
            self.running.len() + self.backlog.len()
        }
    }

    fn check_invariants(&self) {
        if self.running.len() > self.admission_limit {
            error!(
                running = self.running.len(),
                limit = self.admission_limit,
                "This many jobs should not be running"
            );
        }

        let tracked = self.backlog.len() + self.running.len() + self.done.len();
        if tracked != self.total {
            error!(
                tracked,
                total = self.total,
                "Scheduler lost track of submitted jobs"
            );
        }
    }

    /// Ids of jobs that settled since the previous call, each reported once.
    pub fn take_finished(&mut self) -> Vec<JobId> {
        std::mem::take(&mut self.finished)
    }

    /// Whether every submitted job is done.
    pub fn is_settled(&self) -> bool {
        self.done.len() == self.total
    }

    pub fn counts(&self) -> SchedulerCounts {
        SchedulerCounts {
            backlog: self.backlog.len(),
            running: self.running.len(),
            done: self.done.len(),
            total: self.total,
        }
    }

    /// Labels of the jobs currently running.
    pub fn running_labels(&self) -> Vec<String> {
        self.running.iter().map(|j| j.label().to_string()).collect()
    }

    /// Label of the job that would be admitted next, if any.
    pub fn next_label(&self) -> Option<&str> {
        self.backlog.last().map(Job::label)
    }

    pub fn job(&self, id: JobId) -> Option<&Job> {
        self.iter().find(|j| j.id() == id)
    }

    pub fn job_mut(&mut self, id: JobId) -> Option<&mut Job> {
        self.done
            .iter_mut()
            .chain(self.running.iter_mut())
            .chain(self.backlog.iter_mut())
            .find(|j| j.id() == id)
    }

    /// Every job, done ones first.
    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.done
            .iter()
            .chain(self.running.iter())
            .chain(self.backlog.iter())
    }
}
