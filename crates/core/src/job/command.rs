//! Process invocations and the per-file command template.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

/// Template argument replaced by the input path.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Template argument replaced by the output path.
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// A resolved program invocation: the executable plus its argument vector.
///
/// Arguments are handed to the OS as-is, no shell is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl JobCommand {
    /// Creates a command running `program` with no arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    /// The executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The arguments, in order.
    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    /// Builds a tokio command with stdin closed and both output streams piped.
    pub(crate) fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }
}

impl fmt::Display for JobCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.contains(char::is_whitespace) || arg.contains('"') {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Fixed invocation template for the converter.
///
/// Each argument equal to [`INPUT_PLACEHOLDER`] or [`OUTPUT_PLACEHOLDER`] is
/// replaced by the corresponding path without any lossy conversion. Placeholders
/// embedded in a longer argument (e.g. `--out={output}`) are substituted textually.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandTemplate {
    /// Creates a template for `program` with the given argument pattern.
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// The executable every rendered command runs.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Renders the command for one input/output pair.
    pub fn render(&self, input: &Path, output: &Path) -> JobCommand {
        let args = self.args.iter().map(|arg| match arg.as_str() {
            INPUT_PLACEHOLDER => input.as_os_str().to_os_string(),
            OUTPUT_PLACEHOLDER => output.as_os_str().to_os_string(),
            other => OsString::from(
                other
                    .replace(INPUT_PLACEHOLDER, &input.to_string_lossy())
                    .replace(OUTPUT_PLACEHOLDER, &output.to_string_lossy()),
            ),
        });

        JobCommand::new(self.program.clone()).args(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bfconvert_template() -> CommandTemplate {
        CommandTemplate::new(
            "/opt/bftools/bfconvert",
            vec![
                "-no-upgrade".to_string(),
                "-compression".to_string(),
                "zlib".to_string(),
                INPUT_PLACEHOLDER.to_string(),
                OUTPUT_PLACEHOLDER.to_string(),
            ],
        )
    }

    #[test]
    fn test_render_substitutes_paths() {
        let cmd = bfconvert_template().render(Path::new("/data/a.oib"), Path::new("/out/a.ome"));

        assert_eq!(cmd.program(), Path::new("/opt/bftools/bfconvert"));
        assert_eq!(
            cmd.arguments(),
            &[
                OsString::from("-no-upgrade"),
                OsString::from("-compression"),
                OsString::from("zlib"),
                OsString::from("/data/a.oib"),
                OsString::from("/out/a.ome"),
            ]
        );
    }

    #[test]
    fn test_render_keeps_quotes_intact() {
        let input = Path::new("/data/my \"special\" file.oib");
        let cmd = bfconvert_template().render(input, Path::new("/out/x.ome"));

        assert_eq!(cmd.arguments()[3].as_os_str(), input.as_os_str());
    }

    #[test]
    fn test_render_embedded_placeholder() {
        let template = CommandTemplate::new("conv", vec!["--out={output}".to_string()]);
        let cmd = template.render(Path::new("in.tif"), Path::new("out.ome"));

        assert_eq!(cmd.arguments(), &[OsString::from("--out=out.ome")]);
    }

    #[test]
    fn test_display_quotes_arguments_with_spaces() {
        let cmd = JobCommand::new("bfconvert").arg("-no-upgrade").arg("my file.oib");
        assert_eq!(cmd.to_string(), "bfconvert -no-upgrade \"my file.oib\"");
    }
}
