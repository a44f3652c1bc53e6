//! Batch conversion driver.
//!
//! The driver maps registered (input, output) pairs onto converter jobs, skips
//! inputs whose output already exists, runs the rest through a
//! [`Scheduler`](crate::scheduler::Scheduler) and classifies every finished job
//! by its exit code. Failed conversions never leave a partial output behind.
//!
//! # Example
//!
//! ```ignore
//! use bfbatch_core::driver::{ConversionDriver, ConverterConfig};
//! use bfbatch_core::scheduler::SchedulerConfig;
//!
//! let mut driver = ConversionDriver::new(ConverterConfig::default(), SchedulerConfig::default());
//! driver.register("/data/Image0035.oib", "/cache/e06250156e.ome")?;
//!
//! let report = driver.run_batch().await?;
//! println!("{} converted, {} failed", report.converted.len(), report.failed.len());
//! ```

mod classify;
mod config;
mod error;
mod runner;
mod ticker;
mod types;

pub use classify::{classify, Verdict};
pub use config::{ConverterConfig, UnknownExitPolicy};
pub use error::DriverError;
pub use runner::ConversionDriver;
pub use ticker::{FixedDelay, TickSource};
pub use types::{BatchReport, DriverState, FailureReason};
