//! Command line arguments.

use clap::Parser;
use std::path::PathBuf;

use bfbatch_core::Config;

/// Convert microscopy files through an external converter, a few at a time.
#[derive(Debug, Parser)]
#[command(name = "bfbatch", version, about)]
pub struct Args {
    /// Configuration file.
    #[arg(short, long, env = "BFBATCH_CONFIG", default_value = "bfbatch.toml")]
    pub config: PathBuf,

    /// Directory receiving converted files.
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Maximum number of converter processes running at once.
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Skip the runtime and converter checks.
    #[arg(long)]
    pub skip_preflight: bool,

    /// Print the batch report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Files to convert.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
}

impl Args {
    /// Applies command line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(jobs) = self.jobs {
            config.scheduler.admission_limit = jobs;
        }
        if self.skip_preflight {
            config.preflight.enabled = false;
        }
    }
}
