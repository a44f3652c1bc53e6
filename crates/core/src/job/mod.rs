//! External process jobs.
//!
//! A [`Job`] wraps exactly one invocation of an external program. It is started
//! without blocking, polled for completion, and once finished exposes the exit
//! code together with everything the process wrote to stdout and stderr.
//!
//! # Example
//!
//! ```ignore
//! use bfbatch_core::job::{Job, JobCommand, JobOutcome};
//!
//! let mut job = Job::new("image.oib", JobCommand::new("bfconvert").arg("image.oib").arg("out.ome"));
//! job.start()?;
//! while !job.poll() {
//!     tokio::time::sleep(Duration::from_millis(100)).await;
//! }
//! if let JobOutcome::Exited(result) = job.result().await? {
//!     println!("exit code {:?}", result.exit_code);
//! }
//! ```

mod command;
mod error;
mod process;
mod types;

pub use command::{CommandTemplate, JobCommand, INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER};
pub use error::JobError;
pub use process::Job;
pub use types::{JobId, JobOutcome, JobResult, JobState, LaunchFailure};
