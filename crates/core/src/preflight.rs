//! Environment checks run before a driver is built.
//!
//! The converter needs a runtime (a JVM for bftools) and its own executable at
//! the configured location. Both are probed once up front so a misconfigured
//! install fails loudly instead of failing every file of a batch.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::driver::ConverterConfig;

/// Preflight settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreflightConfig {
    /// Run the checks before building a driver.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Command proving the runtime is installed. Empty skips the runtime check.
    #[serde(default = "default_runtime_command")]
    pub runtime_command: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_runtime_command() -> Vec<String> {
    vec!["java".to_string(), "-version".to_string()]
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            runtime_command: default_runtime_command(),
        }
    }
}

impl PreflightConfig {
    /// A config that skips every check.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Errors found by the preflight checks.
#[derive(Debug, Error)]
pub enum PreflightError {
    /// The runtime command could not be started.
    #[error("runtime missing: `{command}` could not be started; it is needed to convert files")]
    RuntimeMissing { command: String },

    /// The runtime command ran but reported an error.
    #[error("runtime check `{command}` failed with exit code {exit_code:?}")]
    RuntimeFailed {
        command: String,
        exit_code: Option<i32>,
    },

    /// The converter is not at its expected location.
    #[error("converter not found at {path}")]
    ToolNotFound { path: PathBuf },

    /// The converter exists but could not be executed.
    #[error("converter at {path} could not be executed: {source}")]
    ToolNotExecutable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Runs the runtime and converter checks, unless disabled.
pub async fn run_preflight(
    converter: &ConverterConfig,
    preflight: &PreflightConfig,
) -> Result<(), PreflightError> {
    if !preflight.enabled {
        debug!("Preflight checks disabled");
        return Ok(());
    }

    check_runtime(&preflight.runtime_command).await?;
    check_tool(converter).await?;

    info!("Converter found at {}", converter.tool_path().display());
    Ok(())
}

async fn check_runtime(command: &[String]) -> Result<(), PreflightError> {
    let Some((program, args)) = command.split_first() else {
        return Ok(());
    };
    let shown = command.join(" ");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| {
            error!("Runtime check `{}` could not start: {}", shown, e);
            PreflightError::RuntimeMissing {
                command: shown.clone(),
            }
        })?;

    if !output.status.success() {
        error!("Runtime check `{}` failed", shown);
        return Err(PreflightError::RuntimeFailed {
            command: shown,
            exit_code: output.status.code(),
        });
    }

    Ok(())
}

async fn check_tool(converter: &ConverterConfig) -> Result<(), PreflightError> {
    let path = converter.tool_path();

    let output = Command::new(&path)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                error!("Wrong location for converter: {}", converter.tool_dir.display());
                PreflightError::ToolNotFound { path: path.clone() }
            } else {
                PreflightError::ToolNotExecutable {
                    path: path.clone(),
                    source: e,
                }
            }
        })?;

    // A wrapper script that cannot find its own binary exits with 127.
    if output.status.code() == Some(127) {
        error!("Wrong location for converter: {}", converter.tool_dir.display());
        return Err(PreflightError::ToolNotFound { path });
    }

    Ok(())
}
