//! External process execution.
//!
//! Child processes inherit stdout and stderr: build and install output goes
//! straight to the operator's terminal or service log, nothing is captured.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// A fully rendered command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Executable (resolved through `PATH` when not a path).
    pub program: String,

    pub args: Vec<String>,

    /// Working directory; `None` inherits the caller's.
    pub working_dir: Option<PathBuf>,

    /// Kill the child after this long. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            timeout: None,
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

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Program and arguments joined by spaces, for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// How a child process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Normal exit with a status code.
    Exited(i32),

    /// Terminated by a signal (no exit code).
    Signalled,

    /// The command could not be started at all.
    LaunchFailed(String),

    /// Killed after exceeding its timeout.
    TimedOut(Duration),
}

impl RunOutcome {
    /// Only a zero exit code counts as success.
    pub fn success(&self) -> bool {
        matches!(self, RunOutcome::Exited(0))
    }

    pub fn describe(&self) -> String {
        match self {
            RunOutcome::Exited(code) => format!("exited with code {code}"),
            RunOutcome::Signalled => "terminated by signal".to_string(),
            RunOutcome::LaunchFailed(err) => format!("failed to launch: {err}"),
            RunOutcome::TimedOut(limit) => format!("timed out after {}s", limit.as_secs()),
        }
    }
}

/// Runs one command to completion.
///
/// Implementations never return an error: a command that cannot be started
/// is reported as [`RunOutcome::LaunchFailed`].
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, command: &CommandSpec) -> RunOutcome;
}

/// Runs commands as real child processes via `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, command: &CommandSpec) -> RunOutcome {
        debug!(command = %command.command_line(), cwd = ?command.working_dir, "Spawning process");

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return RunOutcome::LaunchFailed(e.to_string()),
        };

        let status = match command.timeout {
            Some(limit) if !limit.is_zero() => {
                let waited = tokio::time::timeout(limit, child.wait()).await;
                match waited {
                    Ok(status) => status,
                    Err(_) => {
                        let _ = child.kill().await;
                        return RunOutcome::TimedOut(limit);
                    }
                }
            }
            _ => child.wait().await,
        };

        match status {
            Ok(status) => match status.code() {
                Some(code) => RunOutcome::Exited(code),
                None => RunOutcome::Signalled,
            },
            Err(e) => RunOutcome::LaunchFailed(e.to_string()),
        }
    }
}
