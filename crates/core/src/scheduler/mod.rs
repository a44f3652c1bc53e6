//! Admission-controlled scheduling of external process jobs.
//!
//! The [`Scheduler`] keeps an unbounded backlog of pending jobs and starts at
//! most `admission_limit` of them at a time. It has no background activity of
//! its own: the owner calls [`Scheduler::advance`] repeatedly and all
//! bookkeeping happens inside that call.

mod config;
mod queue;

pub use config::SchedulerConfig;
pub use queue::{Scheduler, SchedulerCounts};
