pub mod config;
pub mod driver;
pub mod job;
pub mod naming;
pub mod observer;
pub mod preflight;
pub mod scheduler;
pub mod testing;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config, ConfigError,
};
pub use driver::{
    BatchReport, ConversionDriver, ConverterConfig, DriverError, DriverState, FailureReason,
    FixedDelay, TickSource, UnknownExitPolicy,
};
pub use job::{Job, JobCommand, JobError, JobId, JobOutcome, JobResult, JobState};
pub use naming::{output_path_for, OutputConfig, OutputNaming};
pub use observer::{ConversionObserver, LoggingObserver, NoopObserver};
pub use preflight::{run_preflight, PreflightConfig, PreflightError};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerCounts};
