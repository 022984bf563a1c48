//! Process spawning seam

#[cfg(test)]
use mockall::automock;

use std::path::PathBuf;
use std::process::Stdio;

use tokio::fs::OpenOptions;
use tokio::process::Command;
use tracing::debug;

/// Where a child's stdout/stderr go
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Capture both streams into the returned [`ProcessOutput`]
    #[default]
    Capture,
    /// Let the child write to our own stdout/stderr; nothing is captured
    Inherit,
    /// Append both streams to this file; nothing is captured
    File(PathBuf),
}

/// A single command to run to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub output: OutputMode,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>, working_dir: PathBuf) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir,
            output: OutputMode::Capture,
        }
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    /// `program arg arg` as a human would type it
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Result of a completed process
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessOutput {
    /// Exit code; -1 when the process was terminated by a signal
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Trait for running external processes
///
/// Timeouts, if any, belong to implementations of this trait; callers await
/// completion unconditionally.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<ProcessOutput>;
}

/// Runs invocations as child processes via `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRunner;

#[async_trait::async_trait]
impl ProcessRunner for CommandRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<ProcessOutput> {
        debug!(
            "Spawning `{}` in {:?}",
            invocation.command_line(),
            invocation.working_dir
        );

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null());

        let (stdout, stderr) = match &invocation.output {
            OutputMode::Capture => (Stdio::piped(), Stdio::piped()),
            OutputMode::Inherit => (Stdio::inherit(), Stdio::inherit()),
            OutputMode::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await?
                    .into_std()
                    .await;
                let err = file.try_clone()?;
                (Stdio::from(file), Stdio::from(err))
            }
        };
        command.stdout(stdout).stderr(stderr);

        let output = command.spawn()?.wait_with_output().await?;

        let exit_code = output.status.code().unwrap_or(-1);
        debug!("`{}` exited with {}", invocation.command_line(), exit_code);

        Ok(ProcessOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
