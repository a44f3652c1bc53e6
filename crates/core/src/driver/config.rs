//! Configuration for the external converter.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::job::{CommandTemplate, INPUT_PLACEHOLDER, OUTPUT_PLACEHOLDER};

/// How exit codes other than 0, 1 and 127 are classified.
///
/// Also applies to processes terminated by a signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownExitPolicy {
    /// Count the file as failed and remove any partial output.
    #[default]
    Failure,
    /// Count the file as converted.
    Success,
}

/// Configuration of the converter invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Directory holding the converter tools.
    #[serde(default = "default_tool_dir")]
    pub tool_dir: PathBuf,

    /// Converter executable, resolved against `tool_dir`.
    #[serde(default = "default_executable")]
    pub executable: String,

    /// Argument template. `{input}` and `{output}` are replaced per file.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Classification of unexpected exit codes.
    #[serde(default)]
    pub unknown_exit_codes: UnknownExitPolicy,
}

fn default_tool_dir() -> PathBuf {
    PathBuf::from("bftools")
}

fn default_executable() -> String {
    "bfconvert".to_string()
}

fn default_args() -> Vec<String> {
    vec![
        "-no-upgrade".to_string(),
        "-compression".to_string(),
        "zlib".to_string(),
        INPUT_PLACEHOLDER.to_string(),
        OUTPUT_PLACEHOLDER.to_string(),
    ]
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            tool_dir: default_tool_dir(),
            executable: default_executable(),
            args: default_args(),
            unknown_exit_codes: UnknownExitPolicy::default(),
        }
    }
}

impl ConverterConfig {
    /// Creates a config running `executable` from `tool_dir` with the default arguments.
    pub fn with_tool(tool_dir: impl Into<PathBuf>, executable: impl Into<String>) -> Self {
        Self {
            tool_dir: tool_dir.into(),
            executable: executable.into(),
            ..Default::default()
        }
    }

    /// Replaces the argument template.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the unknown exit code policy.
    pub fn with_unknown_exit_codes(mut self, policy: UnknownExitPolicy) -> Self {
        self.unknown_exit_codes = policy;
        self
    }

    /// Full path of the converter executable.
    pub fn tool_path(&self) -> PathBuf {
        self.tool_dir.join(&self.executable)
    }

    /// The command template every job is rendered from.
    pub fn template(&self) -> CommandTemplate {
        CommandTemplate::new(self.tool_path(), self.args.clone())
    }
}
