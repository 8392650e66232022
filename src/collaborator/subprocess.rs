//! Subprocess helper shared by the built-in collaborators

use crate::collaborator::StepError;
use crate::core::SecretMask;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};

/// How many trailing stderr lines go into an error message
const STDERR_TAIL_LINES: usize = 20;

/// A command to run in a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, cwd: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Command line for log messages
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured output of a finished command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// A command that ran but exited unsuccessfully
///
/// Keeps both output streams so the run log shows what the tool printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    /// Command line, secrets already masked
    pub command: String,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "`{}` exited with code {}{}",
            self.command,
            self.exit_code,
            stderr_tail(&self.stderr)
        )
    }
}

/// Run a command to completion
///
/// The child is killed if the returned future is dropped, which is how
/// step timeouts stop a running tool. The command line is masked with
/// `secrets` wherever it is logged or reported.
///
/// # Errors
/// - `StepError::Execution` if the program cannot be spawned
/// - `StepError::Command` if the program exits with a non-zero status
pub async fn run_command(cmd: &CommandSpec, secrets: &SecretMask) -> Result<CommandOutput, StepError> {
    let shown = secrets.apply(&cmd.display());
    debug!("Running `{}` in {}", shown, cmd.cwd.display());

    let output = Command::new(&cmd.program)
        .args(&cmd.args)
        .current_dir(&cmd.cwd)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            StepError::Execution(format!("failed to spawn `{}`: {}", cmd.program, e))
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        let exit_code = output.status.code().unwrap_or(-1);
        warn!("`{}` exited with code {}", shown, exit_code);
        return Err(StepError::Command(CommandFailure {
            command: shown,
            exit_code,
            stdout,
            stderr,
        }));
    }

    debug!("`{}` returned {} bytes of output", cmd.program, stdout.len());

    Ok(CommandOutput { stdout, stderr })
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return String::new();
    }
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    format!(": {}", lines[start..].join("\n"))
}
